//! Minimal native reader for flat ROOT `TTree`s.
//!
//! Covers what schema inspection needs: the file header, the top-level key
//! list, branch/leaf metadata and basket values for min/max scans.

pub mod basket;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod key;
pub mod rbuffer;
#[cfg(test)]
pub(crate) mod testutil;
pub mod tree;
pub mod ttree;

pub use error::{Result, RootError};
pub use file::RootFile;
pub use tree::{BranchInfo, LeafInfo, LeafType, Tree};
