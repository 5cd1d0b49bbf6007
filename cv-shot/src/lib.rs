//! # Camera shots
//!
//! A [`Shot`] is one calibrated image of a reconstruction: the pose of the camera in the world
//! and the intrinsic parameters that map camera-space directions to pixels. Everything that needs
//! to move between an image and the reconstructed scene goes through the [`CameraModel`] trait,
//! which a [`Shot`] implements.
//!
//! Coordinate conventions follow the usual computer vision frame:
//!
//! * Camera space has its origin at the optical center, positive X right, positive Y down and
//!   positive Z forwards.
//! * Image space has its origin at the top left pixel, X right and Y down.
//!
//! ```text
//!                 @ image plane (depth 1)
//!                 @
//!     O-----------k-----------p
//!                 @
//!                 @
//! ```
//!
//! - `O` the optical center
//! - `k` the keypoint of `p` on the image
//! - `p` a point in the world
//!
//! [`CameraModel::project`] maps `p` to `k`. [`CameraModel::unproject`] goes the other way,
//! but since the depth of `p` is lost during projection it must be supplied.

mod intrinsics;
mod keypoint;
mod pose;
mod shot;
pub mod triangulation;

pub use intrinsics::*;
pub use keypoint::*;
pub use nalgebra;
pub use pose::*;
pub use shot::*;

use nalgebra::{Point3, Unit, Vector3};

/// Maps between world points and pixels of a single image.
pub trait CameraModel {
    /// The optical center of the camera in world coordinates.
    fn optical_center(&self) -> Point3<f64>;

    /// Projects a world point onto the image.
    ///
    /// Returns `None` if the point lies on or behind the image plane of the camera.
    fn project(&self, point: Point3<f64>) -> Option<KeyPoint>;

    /// Lifts a pixel back into the world at the given depth along the optical axis.
    fn unproject(&self, keypoint: KeyPoint, depth: f64) -> Point3<f64>;

    /// The world-space direction of the light that hit the given pixel.
    fn bearing(&self, keypoint: KeyPoint) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.unproject(keypoint, 1.0) - self.optical_center())
    }
}
