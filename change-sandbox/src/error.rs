use cv_neighbors::MatchError;
use cv_occlusion::GridError;
use cv_pointclouds::PlyError;
use cv_visibility::MeshError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("{}: {source}", path.display())]
    Ply { path: PathBuf, source: PlyError },
    #[error("{}: {source}", path.display())]
    Match { path: PathBuf, source: MatchError },
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("invalid occlusion grid: {0}")]
    Grid(#[from] GridError),
    #[error("camera {index} requested but only {count} cameras were loaded")]
    MissingCamera { index: usize, count: usize },
}
