use cv_visibility::VisibilitySettings;
use serde::{Deserialize, Serialize};

/// The settings for change projection.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSettings {
    /// The number of nearest reference points that vote on the images observing a vertex
    #[serde(default = "default_knn_reference_points")]
    pub knn_reference_points: usize,
    /// The number of candidate images kept per vertex
    #[serde(default = "default_candidate_images")]
    pub candidate_images: usize,
    /// The vertex neighborhood radius in multiples of the mean edge length of the mesh
    #[serde(default = "default_radius_multiplier")]
    pub radius_multiplier: f64,
    /// The edge length of a voxel of the occlusion grid
    #[serde(default = "default_leaf_size")]
    pub leaf_size: f64,
    /// The depth pixels are unprojected to when building rays
    #[serde(default = "default_unproject_depth")]
    pub unproject_depth: f64,
    /// The number of registered neighbors kept per new image
    #[serde(default = "default_nearest_neighbors")]
    pub nearest_neighbors: usize,
}

impl ChangeSettings {
    pub fn visibility(&self) -> VisibilitySettings {
        VisibilitySettings {
            knn: self.knn_reference_points,
            candidates: self.candidate_images,
            radius_multiplier: self.radius_multiplier,
        }
    }
}

impl Default for ChangeSettings {
    fn default() -> Self {
        Self {
            knn_reference_points: default_knn_reference_points(),
            candidate_images: default_candidate_images(),
            radius_multiplier: default_radius_multiplier(),
            leaf_size: default_leaf_size(),
            unproject_depth: default_unproject_depth(),
            nearest_neighbors: default_nearest_neighbors(),
        }
    }
}

fn default_knn_reference_points() -> usize {
    10
}

fn default_candidate_images() -> usize {
    9
}

fn default_radius_multiplier() -> f64 {
    7.0
}

fn default_leaf_size() -> f64 {
    0.05
}

fn default_unproject_depth() -> f64 {
    100.0
}

fn default_nearest_neighbors() -> usize {
    5
}
