use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("face {face} references vertex {vertex} but the mesh has {vertices} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        vertex: usize,
        vertices: usize,
    },
}

/// A triangle mesh. Read-only while visibility is resolved.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    /// Creates a mesh, checking that every face references an existing vertex.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&ix| ix >= vertices.len()) {
                return Err(MeshError::FaceIndexOutOfRange {
                    face,
                    vertex,
                    vertices: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// The average length of every half-edge of every face.
    ///
    /// Edges shared by two faces are counted once per face. A mesh without faces has a mean edge
    /// length of `0.0`.
    pub fn mean_edge_length(&self) -> f64 {
        if self.faces.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .faces
            .iter()
            .map(|&[a, b, c]| {
                let [a, b, c] = [a, b, c].map(|ix| self.vertices[ix]);
                (b - a).norm() + (c - b).norm() + (a - c).norm()
            })
            .sum();
        total / (3 * self.faces.len()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_edge_length_counts_half_edges() {
        // Two right triangles sharing the hypotenuse of a unit square.
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let expected = (4.0 + 2.0 * 2f64.sqrt()) / 6.0;
        assert_relative_eq!(mesh.mean_edge_length(), expected, epsilon = 1e-12);
    }

    #[test]
    fn no_faces_no_edges() {
        let mesh = Mesh::new(vec![Point3::origin()], vec![]).unwrap();
        assert_eq!(mesh.mean_edge_length(), 0.0);
    }

    #[test]
    fn rejects_dangling_face() {
        let err = Mesh::new(vec![Point3::origin(); 2], vec![[0, 1, 2]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::FaceIndexOutOfRange {
                face: 0,
                vertex: 2,
                vertices: 2
            }
        );
    }
}
