use crate::{ImageId, Mesh, Neighbor, ReferenceCloud, SpatialIndex, VoteTally};
use cv_shot::{CameraModel, KeyPoint, Shot};
use itertools::iproduct;
use log::*;
use nalgebra::Point3;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Number of resolved vertices between two progress messages of a sweep.
const PROGRESS_INTERVAL: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct VisibilitySettings {
    /// The number of nearest reference points that vote for a vertex.
    pub knn: usize,
    /// The maximum number of candidate images kept per vertex.
    pub candidates: usize,
    /// The neighborhood radius in multiples of the mean edge length of the mesh.
    pub radius_multiplier: f64,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            knn: 10,
            candidates: 9,
            radius_multiplier: 7.0,
        }
    }
}

/// The images that most likely observe one vertex and the mesh vertices around it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Visibility {
    /// Candidate images, most votes first.
    pub candidates: Vec<ImageId>,
    /// Indices of the mesh vertices within the search radius, nearest first.
    pub neighborhood: Vec<usize>,
}

/// A neighborhood vertex as seen by one candidate image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborProjection {
    pub image: ImageId,
    pub vertex: usize,
    pub keypoint: KeyPoint,
}

impl Visibility {
    /// Returns `true` if no image voted for the vertex, in which case nothing is projected.
    pub fn is_unobserved(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Projects every neighborhood vertex into every candidate image.
    ///
    /// `shots` is indexed by [`ImageId`]. Only projections that land on the source image are
    /// kept. The output is ordered by candidate and then by neighborhood order.
    pub fn project_neighborhood(
        &self,
        shots: &[Shot],
        vertices: &[Point3<f64>],
    ) -> Vec<NeighborProjection> {
        let candidates = self.candidates.iter().filter_map(|&image| {
            let shot = shots.get(image.index());
            if shot.is_none() {
                warn!("candidate image {} has no shot, skipping it", image);
            }
            shot.map(|shot| (image, shot))
        });
        iproduct!(candidates, self.neighborhood.iter().copied())
            .filter_map(|((image, shot), vertex)| {
                let keypoint = shot.project(*vertices.get(vertex)?)?;
                shot.in_viewport(keypoint).then(|| NeighborProjection {
                    image,
                    vertex,
                    keypoint,
                })
            })
            .collect()
    }
}

/// Buffers reused between calls to [`VisibilityResolver::resolve`].
///
/// Each worker of a sweep owns one.
#[derive(Debug, Clone, Default)]
pub struct ResolverScratch {
    tally: VoteTally,
    nearest: Vec<Neighbor>,
    within: Vec<Neighbor>,
}

impl ResolverScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decides which images observe the vertices of a mesh.
///
/// `R` indexes the points of the reference cloud and `M` indexes the vertices of the mesh.
pub struct VisibilityResolver<'a, R, M> {
    reference: &'a ReferenceCloud,
    reference_index: &'a R,
    mesh_index: &'a M,
    settings: VisibilitySettings,
    search_radius: f64,
}

impl<'a, R, M> VisibilityResolver<'a, R, M>
where
    R: SpatialIndex,
    M: SpatialIndex,
{
    /// The search radius is `radius_multiplier` times the mean edge length of `mesh`.
    pub fn new(
        reference: &'a ReferenceCloud,
        reference_index: &'a R,
        mesh: &Mesh,
        mesh_index: &'a M,
        settings: VisibilitySettings,
    ) -> Self {
        let search_radius = settings.radius_multiplier * mesh.mean_edge_length();
        debug!(
            "visibility search radius {} ({} x mean edge length)",
            search_radius, settings.radius_multiplier
        );
        Self {
            reference,
            reference_index,
            mesh_index,
            settings,
            search_radius,
        }
    }

    pub fn search_radius(&self) -> f64 {
        self.search_radius
    }

    /// Resolves the candidate images and the neighborhood of a single vertex.
    pub fn resolve(&self, vertex: Point3<f64>, scratch: &mut ResolverScratch) -> Visibility {
        let ResolverScratch {
            tally,
            nearest,
            within,
        } = scratch;

        tally.clear();
        self.reference_index
            .k_nearest(vertex, self.settings.knn, nearest);
        for neighbor in nearest.iter() {
            let correspondences = self
                .reference
                .correspondences(neighbor.index)
                .unwrap_or_default();
            for correspondence in correspondences {
                tally.vote(correspondence.image);
            }
        }

        self.mesh_index
            .within_radius(vertex, self.search_radius, within);

        Visibility {
            candidates: tally.top(self.settings.candidates),
            neighborhood: within.iter().map(|n| n.index).collect(),
        }
    }

    /// Resolves every vertex, in input order.
    pub fn resolve_all(&self, vertices: &[Point3<f64>]) -> Vec<Visibility> {
        info!("resolving visibility of {} vertices", vertices.len());
        let resolved = AtomicUsize::new(0);
        let resolve = |scratch: &mut ResolverScratch, &vertex: &Point3<f64>| {
            let visibility = self.resolve(vertex, scratch);
            let done = resolved.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_INTERVAL == 0 {
                info!("resolved {}/{} vertices", done, vertices.len());
            }
            visibility
        };

        #[cfg(not(feature = "rayon"))]
        let visibilities: Vec<Visibility> = {
            let mut scratch = ResolverScratch::new();
            vertices.iter().map(|v| resolve(&mut scratch, v)).collect()
        };

        #[cfg(feature = "rayon")]
        let visibilities: Vec<Visibility> = vertices
            .par_iter()
            .map_init(ResolverScratch::new, resolve)
            .collect();

        let unobserved = visibilities.iter().filter(|v| v.is_unobserved()).count();
        info!(
            "resolved visibility of {} vertices, {} without candidate images",
            visibilities.len(),
            unobserved
        );
        visibilities
    }
}
