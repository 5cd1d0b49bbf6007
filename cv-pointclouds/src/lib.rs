//! # Point clouds
//!
//! PLY input for reconstructed meshes and clouds, and PLY output for the 3d change points
//! projected out of change masks.

mod export;
mod ply;

pub use crate::export::*;
pub use crate::ply::*;
