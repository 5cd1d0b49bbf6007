use crate::Mask;
use log::*;
use nalgebra::{Point2, Point3};
use std::collections::BTreeSet;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A reconstruction feature of one image.
///
/// The position is relative to the center of the image, as bundle files store it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ImageFeature {
    pub position: Point2<f64>,
    /// Index of the 3d point the feature was triangulated into.
    pub correspondence: usize,
}

/// A reconstructed 3d point and the color it was seen with.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PointCorrespondence {
    pub point: Point3<f64>,
    pub color: [u8; 3],
}

/// The reconstructed points whose features lie inside a change mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskCorrespondences {
    /// Each used correspondence once, in order of its first feature.
    pub points: Vec<PointCorrespondence>,
    /// Indices of the used correspondences.
    pub used: BTreeSet<usize>,
}

/// The mask pixel a center-relative feature position falls on, if it is inside the mask.
fn mask_pixel(mask: &Mask, position: Point2<f64>) -> Option<(u32, u32)> {
    let lookup = |coord: f64, extent: u32| {
        let pixel = (coord + (extent / 2) as f64).floor();
        (pixel >= 0.0 && pixel < extent as f64).then(|| pixel as u32)
    };
    Some((
        lookup(position.x, mask.cols())?,
        lookup(position.y, mask.rows())?,
    ))
}

/// Collects the correspondences of every feature of an image that lies inside `mask`.
///
/// Feature positions are shifted by half the mask size before the lookup, so a mask smaller than
/// the image covers its center. Features that reference a missing correspondence are skipped.
pub fn project_correspondences(
    mask: &Mask,
    features: &[ImageFeature],
    correspondences: &[PointCorrespondence],
) -> MaskCorrespondences {
    let mut output = MaskCorrespondences::default();
    let mut inside = 0;
    for feature in features {
        match mask_pixel(mask, feature.position) {
            Some((x, y)) if mask.is_set(x, y) => inside += 1,
            _ => continue,
        }
        let ix = feature.correspondence;
        match correspondences.get(ix) {
            Some(&correspondence) => {
                if output.used.insert(ix) {
                    output.points.push(correspondence);
                }
            }
            None => warn!(
                "feature at {:?} references correspondence {} of {}, skipping it",
                feature.position.coords,
                ix,
                correspondences.len()
            ),
        }
    }
    info!(
        "{} of {} features inside the mask, {} distinct points",
        inside,
        features.len(),
        output.points.len()
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correspondence(ix: usize) -> PointCorrespondence {
        PointCorrespondence {
            point: Point3::new(ix as f64, 0.0, 0.0),
            color: [ix as u8, 0, 0],
        }
    }

    fn feature(x: f64, y: f64, correspondence: usize) -> ImageFeature {
        ImageFeature {
            position: Point2::new(x, y),
            correspondence,
        }
    }

    #[test]
    fn feature_positions_are_centered() {
        // Only the pixel at column 3, row 1 is set.
        let mask = Mask::from_fn(6, 4, |x, y| (x, y) == (3, 1));
        let correspondences: Vec<_> = (0..4).map(correspondence).collect();
        let features = [
            feature(0.0, -1.0, 0),
            feature(0.9, 0.1, 1),
            feature(3.0, 1.0, 2),
            feature(-3.5, 0.0, 3),
        ];
        let projected = project_correspondences(&mask, &features, &correspondences);
        assert_eq!(projected.points, vec![correspondence(0)]);
        assert_eq!(projected.used.into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn shared_correspondence_counts_once() {
        let mask = Mask::from_fn(4, 4, |_, _| true);
        let correspondences: Vec<_> = (0..3).map(correspondence).collect();
        let features = [
            feature(0.0, 0.0, 2),
            feature(1.0, 1.0, 0),
            feature(-1.0, 0.0, 2),
            feature(-2.0, -2.0, 9),
        ];
        let projected = project_correspondences(&mask, &features, &correspondences);
        assert_eq!(projected.points, vec![correspondence(2), correspondence(0)]);
        assert_eq!(projected.used.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }
}
