use crate::KeyPoint;
use nalgebra::{Matrix3, Point2, Vector2, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// Focal lengths and the principal point are in pixels. Lens distortion is assumed to have been
/// removed from the images already.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Intrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
    pub skew: f64,
}

impl Intrinsics {
    /// Intrinsics that produce an identity intrinsic matrix.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            principal_point: Point2::new(0.0, 0.0),
            skew: 0.0,
        }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  self.skew,      self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }

    /// Converts a pixel into the point it lies on in the image plane at depth `1.0`.
    pub fn calibrate(&self, keypoint: KeyPoint) -> Vector3<f64> {
        let centered = keypoint.0 - self.principal_point;
        let y = centered.y / self.focals.y;
        let x = (centered.x - self.skew * y) / self.focals.x;
        Vector3::new(x, y, 1.0)
    }

    /// Converts a camera-space direction into a pixel.
    ///
    /// Returns `None` if the direction does not point in front of the camera.
    pub fn uncalibrate(&self, direction: Vector3<f64>) -> Option<KeyPoint> {
        if direction.z <= 0.0 {
            return None;
        }
        let normalized = direction.xy() / direction.z;
        let y = normalized.y * self.focals.y;
        let x = normalized.x * self.focals.x + self.skew * normalized.y;
        Some(KeyPoint(Point2::new(x, y) + self.principal_point.coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn calibrate_inverts_uncalibrate() {
        let intrinsics = Intrinsics {
            focals: Vector2::new(800.0, 900.0),
            principal_point: Point2::new(500.0, 600.0),
            skew: 1.7,
        };
        let kp = KeyPoint::new(471.0, 322.0);
        let direction = intrinsics.calibrate(kp) * 3.0;
        let back = intrinsics.uncalibrate(direction).unwrap();
        assert_relative_eq!(kp.0, back.0, epsilon = 1e-9);
        let homogeneous = intrinsics.matrix() * intrinsics.calibrate(kp);
        assert_relative_eq!(homogeneous.xy(), kp.0.coords, epsilon = 1e-9);
    }

    #[test]
    fn behind_camera_has_no_pixel() {
        let intrinsics = Intrinsics::identity().focal(100.0);
        assert!(intrinsics.uncalibrate(Vector3::new(0.1, 0.1, -1.0)).is_none());
        assert!(intrinsics.uncalibrate(Vector3::new(0.1, 0.1, 0.0)).is_none());
    }
}
