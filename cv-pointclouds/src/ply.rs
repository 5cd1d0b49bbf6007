use log::*;
use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlyError {
    #[error("failed to read PLY: {0}")]
    Io(#[from] io::Error),
    #[error("PLY has no vertex element")]
    MissingVertices,
    #[error("vertex {vertex} has no numeric {property} property")]
    MissingCoordinate {
        vertex: usize,
        property: &'static str,
    },
    #[error("face {face} has no vertex index list")]
    MissingFaceIndices { face: usize },
    #[error("face {face} references vertex {index} but there are {vertices} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: i64,
        vertices: usize,
    },
}

/// The vertices and triangles of a PLY file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlyMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
}

fn scalar(property: &Property) -> Option<f64> {
    Some(match *property {
        Property::Char(n) => n as f64,
        Property::UChar(n) => n as f64,
        Property::Short(n) => n as f64,
        Property::UShort(n) => n as f64,
        Property::Int(n) => n as f64,
        Property::UInt(n) => n as f64,
        Property::Float(n) => n as f64,
        Property::Double(n) => n,
        _ => return None,
    })
}

fn list(property: &Property) -> Option<Vec<i64>> {
    fn widen<T: Copy + Into<i64>>(values: &[T]) -> Vec<i64> {
        values.iter().map(|&n| n.into()).collect()
    }
    Some(match property {
        Property::ListChar(values) => widen(values.as_slice()),
        Property::ListUChar(values) => widen(values.as_slice()),
        Property::ListShort(values) => widen(values.as_slice()),
        Property::ListUShort(values) => widen(values.as_slice()),
        Property::ListInt(values) => widen(values.as_slice()),
        Property::ListUInt(values) => widen(values.as_slice()),
        _ => return None,
    })
}

fn vertex(element: &DefaultElement, ix: usize) -> Result<Point3<f64>, PlyError> {
    let coordinate = |property: &'static str| {
        element
            .get(property)
            .and_then(scalar)
            .ok_or(PlyError::MissingCoordinate {
                vertex: ix,
                property,
            })
    };
    Ok(Point3::new(coordinate("x")?, coordinate("y")?, coordinate("z")?))
}

/// Reads the vertices and faces of an ASCII or binary PLY file.
///
/// Coordinates may use any numeric PLY type. Faces are read from a `vertex_indices` or
/// `vertex_index` list and polygons are split into a fan of triangles around their first vertex.
/// A file without a `face` element yields a point cloud with no faces.
pub fn read_ply(mut reader: impl BufRead) -> Result<PlyMesh, PlyError> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader)?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or(PlyError::MissingVertices)?
        .iter()
        .enumerate()
        .map(|(ix, element)| vertex(element, ix))
        .collect::<Result<Vec<_>, _>>()?;

    let mut faces = vec![];
    for (face, element) in ply.payload.get("face").into_iter().flatten().enumerate() {
        let indices = element
            .get("vertex_indices")
            .or_else(|| element.get("vertex_index"))
            .and_then(list)
            .ok_or(PlyError::MissingFaceIndices { face })?;
        let indices = indices
            .into_iter()
            .map(|index| {
                usize::try_from(index)
                    .ok()
                    .filter(|&ix| ix < vertices.len())
                    .ok_or(PlyError::FaceIndexOutOfRange {
                        face,
                        index,
                        vertices: vertices.len(),
                    })
            })
            .collect::<Result<Vec<usize>, _>>()?;
        if indices.len() < 3 {
            warn!("face {} has only {} vertices, skipping it", face, indices.len());
            continue;
        }
        faces.extend(indices[1..].windows(2).map(|w| [indices[0], w[0], w[1]]));
    }

    info!(
        "read PLY with {} vertices and {} triangles",
        vertices.len(),
        faces.len()
    );
    Ok(PlyMesh { vertices, faces })
}
