//! # Change mask projection
//!
//! A change detector marks the pixels of an image that differ from the reconstructed scene. This
//! crate lifts such a [`Mask`] back into 3d in three ways:
//!
//! * [`RayProjector`] casts a [`Ray`] through every masked pixel into a [`VoxelGrid`] built over
//!   the reconstructed cloud and keeps the first occluding point along each ray.
//! * [`project_correspondences`] skips geometry entirely and collects the 3d points of the
//!   reconstruction features that fall inside the mask.
//! * [`triangulate_mask`] maps the mask into a second image with a homography and triangulates
//!   every pixel from the two shots.
//!
//! Misses are never errors. A pixel whose ray leaves the grid without hitting anything simply
//! contributes no point.

mod correspondence;
mod grid;
mod mask;
mod project;
mod ray;
mod triangulate;

pub use correspondence::*;
pub use grid::*;
pub use mask::*;
pub use project::*;
pub use ray::*;
pub use triangulate::*;
