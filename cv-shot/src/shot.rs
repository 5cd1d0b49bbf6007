use crate::{CameraModel, CameraToWorld, Intrinsics, KeyPoint, Pose, WorldToCamera};
use nalgebra::{Matrix3, Matrix3x4, Point2, Point3, Rotation3, Unit, Vector2, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A single calibrated image: its extrinsic pose, intrinsic parameters and the size of the
/// source image in pixels.
///
/// A shot is immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Shot {
    pose: WorldToCamera,
    intrinsics: Intrinsics,
    viewport: [u32; 2],
}

impl Shot {
    pub fn new(pose: WorldToCamera, intrinsics: Intrinsics, viewport: [u32; 2]) -> Self {
        Self {
            pose,
            intrinsics,
            viewport,
        }
    }

    /// Creates a shot from a bundle/NVM style camera.
    ///
    /// `rotation` and `translation` map world points into camera space (`x' = R x + t`). Pixels
    /// are square with the given `focal` length and the principal point sits at the center pixel
    /// of the `[width, height]` viewport.
    pub fn from_bundle(
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        focal: f64,
        viewport: [u32; 2],
    ) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(rotation);
        let intrinsics = Intrinsics::identity()
            .focal(focal)
            .principal_point(Point2::new(
                (viewport[0] / 2) as f64,
                (viewport[1] / 2) as f64,
            ));
        Self::new(
            WorldToCamera::from_parts(translation, rotation),
            intrinsics,
            viewport,
        )
    }

    pub fn pose(&self) -> WorldToCamera {
        self.pose
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The `[width, height]` of the source image.
    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }

    /// The extrinsic translation vector `t` of `[R | t]`.
    pub fn translation(&self) -> Vector3<f64> {
        self.pose.0.translation.vector
    }

    /// The extrinsic matrix `[R | t]`.
    pub fn extrinsic_matrix(&self) -> Matrix3x4<f64> {
        self.pose.matrix()
    }

    /// The intrinsic matrix `K`.
    pub fn intrinsic_matrix(&self) -> Matrix3<f64> {
        self.intrinsics.matrix()
    }

    /// The full projection matrix `K [R | t]`.
    pub fn projection_matrix(&self) -> Matrix3x4<f64> {
        self.intrinsic_matrix() * self.extrinsic_matrix()
    }

    /// Checks if the keypoint lies on the source image.
    pub fn in_viewport(&self, keypoint: KeyPoint) -> bool {
        let size = Vector2::new(self.viewport[0] as f64, self.viewport[1] as f64);
        keypoint.x >= 0.0 && keypoint.y >= 0.0 && keypoint.x < size.x && keypoint.y < size.y
    }

    pub fn camera_to_world(&self) -> CameraToWorld {
        self.pose.inverse()
    }
}

impl CameraModel for Shot {
    fn optical_center(&self) -> Point3<f64> {
        self.camera_to_world().optical_center()
    }

    fn project(&self, point: Point3<f64>) -> Option<KeyPoint> {
        self.intrinsics
            .uncalibrate(self.pose.transform(point).coords)
    }

    fn unproject(&self, keypoint: KeyPoint, depth: f64) -> Point3<f64> {
        let camera_point = Point3::from(self.intrinsics.calibrate(keypoint) * depth);
        self.camera_to_world().transform(camera_point)
    }

    fn bearing(&self, keypoint: KeyPoint) -> Unit<Vector3<f64>> {
        let direction = self.intrinsics.calibrate(keypoint);
        Unit::new_normalize(self.camera_to_world().0.rotation * direction)
    }
}
