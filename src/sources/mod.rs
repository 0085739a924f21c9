//! Descriptor sources.
//!
//! Sources find the descriptors a package depends on: local directories for
//! path dependencies, local index directories for everything else.

pub mod graph;
pub mod index;
pub mod path;
pub mod source;

pub use graph::{load_package_graph, PackageGraph};
pub use index::IndexSource;
pub use path::PathSource;
pub use source::{LocationKey, PackageCandidate, PackageId, Source};
