//! # Vertex visibility
//!
//! Given a reconstructed [`Mesh`] and a denser [`ReferenceCloud`] whose points remember which
//! images observed them, this crate decides for every mesh vertex which images most likely see it.
//!
//! For one vertex the [`VisibilityResolver`]:
//!
//! 1. finds the `K` reference points nearest to the vertex,
//! 2. lets every [`Correspondence`] of those points cast one vote for its image,
//! 3. keeps the `N` images with the most votes as the candidate image set,
//! 4. gathers the mesh vertices within `radius_multiplier` mean edge lengths of the vertex,
//!    which are the vertices that get projected into the candidate images.
//!
//! Votes are weighted by feature count: a reference point seen twice in the same image gives that
//! image two votes. Ties keep the order in which the images first received a vote.
//!
//! Spatial queries go through the [`SpatialIndex`] trait. [`PointIndex`] implements it with an
//! R-tree. Indices are immutable once built and can be queried from many threads at once, which is
//! how [`VisibilityResolver::resolve_all`] sweeps a whole mesh.

mod index;
mod mesh;
mod reference;
mod resolver;
mod tally;

pub use index::*;
pub use mesh::*;
pub use reference::*;
pub use resolver::*;
pub use tally::*;
