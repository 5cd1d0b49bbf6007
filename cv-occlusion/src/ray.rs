use cv_shot::{CameraModel, KeyPoint};
use nalgebra::{Point3, Unit, Vector3};

/// A half-line starting at `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    /// Returns `None` if `direction` is zero or not finite.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        if !direction.iter().all(|n| n.is_finite()) {
            return None;
        }
        let direction = Unit::try_new(direction, f64::EPSILON)?;
        Some(Self { origin, direction })
    }

    /// The ray from the optical center of `camera` through the point `keypoint` unprojects to at
    /// `depth`.
    pub fn through_pixel(camera: &impl CameraModel, keypoint: KeyPoint, depth: f64) -> Option<Self> {
        let origin = camera.optical_center();
        Self::new(origin, camera.unproject(keypoint, depth) - origin)
    }

    /// The point at parameter `t`, which is its distance from the origin.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction.into_inner() * t
    }

    /// The parameter of the projection of `point` onto the ray.
    pub fn parameter(&self, point: Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.direction)
    }
}
