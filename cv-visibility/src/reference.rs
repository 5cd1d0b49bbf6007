use derive_more::{Display, From, Into};
use nalgebra::Point3;
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Identifies a calibrated image of the reconstruction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ImageId(pub u32);

impl ImageId {
    /// The image id as an index into a list of shots.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A recorded observation of a reference point in one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub image: ImageId,
}

impl From<ImageId> for Correspondence {
    fn from(image: ImageId) -> Self {
        Self { image }
    }
}

/// The dense reference cloud of a reconstruction.
///
/// Every point keeps the list of images it was observed in. An image appears once per feature
/// that observed the point, so the same image may be listed several times.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(try_from = "ReferenceCloudParts")
)]
pub struct ReferenceCloud {
    points: Vec<Point3<f64>>,
    correspondences: Vec<Vec<Correspondence>>,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference cloud has {points} points but {correspondences} correspondence lists")]
    LengthMismatch {
        points: usize,
        correspondences: usize,
    },
}

/// The serialized fields of a [`ReferenceCloud`], before their lengths are checked.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Deserialize))]
pub struct ReferenceCloudParts {
    pub points: Vec<Point3<f64>>,
    pub correspondences: Vec<Vec<Correspondence>>,
}

impl TryFrom<ReferenceCloudParts> for ReferenceCloud {
    type Error = ReferenceError;

    fn try_from(parts: ReferenceCloudParts) -> Result<Self, Self::Error> {
        let ReferenceCloudParts {
            points,
            correspondences,
        } = parts;
        if points.len() != correspondences.len() {
            return Err(ReferenceError::LengthMismatch {
                points: points.len(),
                correspondences: correspondences.len(),
            });
        }
        Ok(Self {
            points,
            correspondences,
        })
    }
}

impl ReferenceCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point with its observations and returns its index.
    pub fn push(&mut self, point: Point3<f64>, correspondences: Vec<Correspondence>) -> usize {
        self.points.push(point);
        self.correspondences.push(correspondences);
        self.points.len() - 1
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// The observations of a point, or `None` if there is no point with that index.
    pub fn correspondences(&self, point: usize) -> Option<&[Correspondence]> {
        self.correspondences.get(point).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(Point3<f64>, Vec<Correspondence>)> for ReferenceCloud {
    fn from_iter<T: IntoIterator<Item = (Point3<f64>, Vec<Correspondence>)>>(iter: T) -> Self {
        let (points, correspondences) = iter.into_iter().unzip();
        Self {
            points,
            correspondences,
        }
    }
}
