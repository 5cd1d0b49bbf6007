//! Triangulation of a world point from its observations in several shots.

use crate::{Pose, WorldToCamera};
use nalgebra::{zero, Matrix4, Point3, Unit, Vector3};

/// A very quick triangulator, suitable for turning matched pixels into display geometry.
/// It is not suitable for points near infinity or for very wide field of view cameras.
///
/// Referred to as the Linear-Eigen method by Hartley and Sturm in the paper
/// ["Triangulation"](https://users.cecs.anu.edu.au/~hartley/Papers/triangulation/triangulation.pdf).
///
/// Each observation contributes the squared distance of the homogeneous point from the ray of its
/// bearing. The point is the eigenvector of the smallest eigenvalue of the summed 4x4 system.
///
/// ```
/// use cv_shot::nalgebra::{Point3, Rotation3, Unit, Vector3};
/// use cv_shot::triangulation::LinearEigenTriangulator;
/// use cv_shot::{Pose, WorldToCamera};
///
/// let point = Point3::new(0.3, 0.1, 2.0);
/// let a = WorldToCamera::identity();
/// let b = WorldToCamera::from_parts(Vector3::new(-0.5, 0.0, 0.1), Rotation3::new(Vector3::new(0.0, 0.1, 0.0)));
/// let observations = [a, b].map(|pose| (pose, Unit::new_normalize(pose.transform(point).coords)));
/// let triangulated = LinearEigenTriangulator::new()
///     .triangulate_observations(observations.iter().copied())
///     .unwrap();
/// assert!((triangulated - point).norm() < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct LinearEigenTriangulator {
    epsilon: f64,
    max_iterations: usize,
}

impl LinearEigenTriangulator {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Triangulates a world point from `(pose, bearing)` observations, where each bearing is
    /// expressed in the camera space of its pose.
    ///
    /// Returns `None` with fewer than two observations, when the solution is at infinity or when
    /// the point would lie behind any of the cameras.
    pub fn triangulate_observations(
        &self,
        pairs: impl Iterator<Item = (WorldToCamera, Unit<Vector3<f64>>)> + Clone,
    ) -> Option<Point3<f64>> {
        if pairs.clone().count() < 2 {
            return None;
        }

        let mut a: Matrix4<f64> = zero();
        for (pose, bearing) in pairs.clone() {
            let bearing = bearing.into_inner();
            let pose = pose.matrix();
            let term = pose - bearing * bearing.transpose() * pose;
            a += term.transpose() * term;
        }

        let se = a.try_symmetric_eigen(self.epsilon, self.max_iterations)?;

        let (ix, _) = se
            .eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| float_ord::FloatOrd(n))?;
        let point = Point3::from_homogeneous(se.eigenvectors.column(ix).into_owned())?;
        if !point.coords.iter().all(|n| n.is_finite()) {
            return None;
        }

        // Cheirality: the point must be in front of every camera that observed it.
        let in_front = pairs
            .into_iter()
            .all(|(pose, bearing)| bearing.dot(&pose.transform(point).coords) > 0.0);
        in_front.then(|| point)
    }
}

impl Default for LinearEigenTriangulator {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn observe(pose: WorldToCamera, point: Point3<f64>) -> (WorldToCamera, Unit<Vector3<f64>>) {
        (pose, Unit::new_normalize(pose.transform(point).coords))
    }

    #[test]
    fn single_observation_is_rejected() {
        let point = Point3::new(0.0, 0.0, 3.0);
        let pairs = [observe(WorldToCamera::identity(), point)];
        assert!(LinearEigenTriangulator::new()
            .triangulate_observations(pairs.iter().copied())
            .is_none());
    }

    #[test]
    fn point_behind_cameras_is_rejected() {
        let point = Point3::new(0.2, 0.1, 3.0);
        let a = WorldToCamera::identity();
        let b = WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity());
        // Flip both bearings so that the only consistent intersection is behind the cameras.
        let pairs = [observe(a, point), observe(b, point)].map(|(pose, bearing)| (pose, -bearing));
        assert!(LinearEigenTriangulator::new()
            .triangulate_observations(pairs.iter().copied())
            .is_none());
    }

    #[test]
    fn three_views_agree() {
        let point = Point3::new(-0.4, 0.3, 4.0);
        let poses = [
            WorldToCamera::identity(),
            WorldToCamera::from_parts(
                Vector3::new(0.5, 0.0, 0.0),
                Rotation3::from_euler_angles(0.0, -0.1, 0.0),
            ),
            WorldToCamera::from_parts(
                Vector3::new(0.0, -0.4, 0.2),
                Rotation3::from_euler_angles(0.05, 0.0, 0.02),
            ),
        ];
        let pairs = poses.map(|pose| observe(pose, point));
        let triangulated = LinearEigenTriangulator::new()
            .triangulate_observations(pairs.iter().copied())
            .unwrap();
        assert!((triangulated - point).norm() < 1e-6);
    }
}
