//! File system storage management
//!
//! Handles listing, folder creation, deletion, uploads and downloads, all on
//! locations produced by the path resolver.

pub mod filesystem;
pub mod operations;
pub mod results;

pub use operations::StorageOperations;
pub use results::{DirectoryListing, ListOutcome};
