use crate::Mask;
use cv_shot::triangulation::LinearEigenTriangulator;
use cv_shot::{KeyPoint, Shot};
use log::*;
use nalgebra::{Matrix3, Point3, Unit};

/// Maps a keypoint through a homography, or `None` if it lands at infinity.
pub fn transfer(homography: &Matrix3<f64>, keypoint: KeyPoint) -> Option<KeyPoint> {
    let mapped = homography * keypoint.to_homogeneous();
    if mapped.z.abs() < f64::EPSILON || !mapped.iter().all(|n| n.is_finite()) {
        return None;
    }
    Some(KeyPoint::new(mapped.x / mapped.z, mapped.y / mapped.z))
}

/// Triangulates the set pixels of a mask detected in `first`.
///
/// `homography` maps pixels of `first` onto the matching pixels of `second`. Every pixel is then
/// triangulated from the two shots. Pixels that map to infinity or triangulate behind either
/// camera are skipped. The output follows the row-major order of the mask.
pub fn triangulate_mask(
    mask: &Mask,
    first: &Shot,
    second: &Shot,
    homography: &Matrix3<f64>,
) -> Vec<Point3<f64>> {
    let triangulator = LinearEigenTriangulator::new();
    let pixels = mask.points();
    let points: Vec<Point3<f64>> = pixels
        .iter()
        .filter_map(|&a| {
            let b = transfer(homography, a)?;
            let observations = [(first, a), (second, b)].map(|(shot, keypoint)| {
                let bearing = Unit::new_normalize(shot.intrinsics().calibrate(keypoint));
                (shot.pose(), bearing)
            });
            triangulator.triangulate_observations(observations.iter().copied())
        })
        .collect();
    info!(
        "triangulated {} of {} masked pixels",
        points.len(),
        pixels.len()
    );
    points
}
