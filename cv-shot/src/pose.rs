use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix3x4, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by the poses in this crate:
///
/// * [`WorldToCamera`] - transforms world points into camera space
/// * [`CameraToWorld`] - transforms camera space points into the world
pub trait Pose: From<IsometryMatrix3<f64>> + Clone + Copy {
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> IsometryMatrix3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }

    /// Retrieve the `[R | t]` matrix of the pose.
    fn matrix(self) -> Matrix3x4<f64> {
        let isometry = self.isometry();
        let mut matrix = Matrix3x4::zeros();
        matrix
            .fixed_slice_mut::<3, 3>(0, 0)
            .copy_from(isometry.rotation.matrix());
        matrix.set_column(3, &isometry.translation.vector);
        matrix
    }

    /// Transform a point by the pose.
    fn transform(self, point: Point3<f64>) -> Point3<f64> {
        self.isometry() * point
    }
}

/// The pose of the world relative to the camera.
///
/// This maps world points into camera space, where the Z coordinate is the depth of the point
/// along the optical axis. This is the extrinsic matrix `[R | t]` of the camera.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldToCamera(pub IsometryMatrix3<f64>);

impl Pose for WorldToCamera {
    type Inverse = CameraToWorld;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

/// The pose of the camera relative to the world.
///
/// The translation of this pose is the optical center of the camera in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToWorld(pub IsometryMatrix3<f64>);

impl Pose for CameraToWorld {
    type Inverse = WorldToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

impl CameraToWorld {
    /// The optical center of the camera in world coordinates.
    pub fn optical_center(self) -> Point3<f64> {
        self.0.translation.vector.into()
    }
}
