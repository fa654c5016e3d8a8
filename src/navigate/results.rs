//! Result types for path resolution

use std::path::{Path, PathBuf};

/// A location inside the storage root.
///
/// Only [`PathResolver`](super::PathResolver) creates these, so holding one
/// means the path has already been normalized and checked for containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    real_path: PathBuf,
    relative_path: String,
}

impl ResolvedLocation {
    pub(crate) fn new(real_path: PathBuf, relative_path: String) -> Self {
        Self {
            real_path,
            relative_path,
        }
    }

    /// Absolute filesystem path
    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    /// Root-relative path with `/` separators and no leading slash; empty at the root
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn is_root(&self) -> bool {
        self.relative_path.is_empty()
    }

    /// Relative path of the enclosing directory, `None` for the root itself.
    pub fn parent_relative_path(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(
            self.relative_path
                .rsplit_once('/')
                .map_or("", |(parent, _)| parent),
        )
    }

    /// Last path segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.relative_path.rsplit('/').next().filter(|s| !s.is_empty())
    }
}
