use crate::{Mask, Ray, VoxelGrid};
use cv_shot::{CameraModel, KeyPoint};
use log::*;
use nalgebra::Point3;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Casts the pixels of a change mask into a [`VoxelGrid`].
#[derive(Debug, Clone, Copy)]
pub struct RayProjector<'a> {
    grid: &'a VoxelGrid,
    unproject_depth: f64,
}

impl<'a> RayProjector<'a> {
    /// `unproject_depth` is the nominal depth pixels are unprojected to when building rays. Any
    /// positive value gives the same rays.
    pub fn new(grid: &'a VoxelGrid, unproject_depth: f64) -> Self {
        Self {
            grid,
            unproject_depth,
        }
    }

    /// The cloud index of the first point hit through each set pixel of `mask`.
    ///
    /// Pixels are visited row by row and the output keeps that order. Pixels whose ray misses the
    /// grid or crosses no occupied cell contribute nothing.
    pub fn project_indices(&self, mask: &Mask, camera: &(impl CameraModel + Sync)) -> Vec<usize> {
        let pixels = mask.points();
        info!("casting {} masked pixels into the voxel grid", pixels.len());
        let cast = |&keypoint: &KeyPoint| self.cast(camera, keypoint);

        #[cfg(not(feature = "rayon"))]
        let hits: Vec<usize> = pixels.iter().filter_map(cast).collect();

        #[cfg(feature = "rayon")]
        let hits: Vec<usize> = pixels.par_iter().filter_map(cast).collect();

        info!(
            "{} of {} masked pixels hit the cloud",
            hits.len(),
            pixels.len()
        );
        hits
    }

    /// The first point hit through each set pixel of `mask`, in mask order.
    pub fn project(&self, mask: &Mask, camera: &(impl CameraModel + Sync)) -> Vec<Point3<f64>> {
        self.project_indices(mask, camera)
            .into_iter()
            .filter_map(|ix| self.grid.point(ix))
            .collect()
    }

    fn cast(&self, camera: &impl CameraModel, keypoint: KeyPoint) -> Option<usize> {
        let ray = match Ray::through_pixel(camera, keypoint, self.unproject_depth) {
            Some(ray) => ray,
            None => {
                warn!("pixel {:?} does not unproject to a ray, skipping it", keypoint.0);
                return None;
            }
        };
        let entry = self.grid.intersect_bounding_box(&ray)?;
        self.grid.first_hit(&ray, entry)
    }
}
