//! # Camera neighbors
//!
//! When new images are added to an existing reconstruction, each one is registered against the
//! already registered images it shares the most features with. This crate reads a pairwise match
//! report with [`MatchReader`], ranks the registered neighbors of every new image with a
//! [`NeighborMatcher`] and hands the rankings to a [`RegistrationService`].
//!
//! ```
//! use cv_neighbors::match_neighbors;
//!
//! let report = "/old/a.jpg\n/new/n.jpg\n2\n10 11\n20 21\n/old/b.jpg\n/new/n.jpg\n2\n3 4\n5 6\n";
//! let rankings = match_neighbors(["/new/n.jpg"], report.as_bytes(), 5).unwrap();
//! let neighbors: Vec<&str> = rankings[0].neighbors().collect();
//! assert_eq!(neighbors, ["/old/b.jpg", "/old/a.jpg"]);
//! ```

mod matcher;
mod reader;
mod registration;

pub use matcher::*;
pub use reader::*;
pub use registration::*;
