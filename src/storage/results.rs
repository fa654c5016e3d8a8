//! Storage result types
//!
//! Defines result structures returned by storage operations.

use crate::navigate::ResolvedLocation;

/// Immediate children of a directory, recomputed on every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub current_path: String,
    /// `None` at the storage root
    pub parent_path: Option<String>,
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

/// Result of listing a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Listing(DirectoryListing),
    /// The location is a regular file; the caller should send its bytes.
    ServeFile(ResolvedLocation),
}
