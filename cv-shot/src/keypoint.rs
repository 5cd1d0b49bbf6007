use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point on an image in pixel coordinates.
///
/// The keypoint is neither undistorted nor normalized. X grows to the right (columns) and Y
/// grows downwards (rows).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl KeyPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }

    /// The keypoint of a pixel given by its column and row.
    pub fn from_pixel(column: u32, row: u32) -> Self {
        Self::new(column as f64, row as f64)
    }
}
