//! Path resolution
//!
//! Every filesystem path the drive touches is produced here. Resolution is
//! lexical: the raw input is normalized as if it were rooted at `/`, so `..`
//! can never climb past the storage root, and the joined result is then checked
//! for containment once more before it is handed out.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::warn;

use crate::error::PathEscapeError;
use crate::navigate::results::ResolvedLocation;

/// Resolves raw request paths against a fixed storage root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    strict_traversal: bool,
}

impl PathResolver {
    /// Creates the root directory if needed and anchors the resolver at its
    /// canonical absolute path.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;

        Ok(Self {
            root: root.canonicalize()?,
            strict_traversal: false,
        })
    }

    /// When enabled, a `..` that would climb above the root is rejected instead
    /// of being clamped to the root.
    pub fn with_strict_traversal(mut self, strict: bool) -> Self {
        self.strict_traversal = strict;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an arbitrary path string to a location inside the root.
    ///
    /// Empty segments, `.` and redundant or leading separators are dropped.
    /// `..` removes the previous segment; at the root it is absorbed unless
    /// strict traversal is on. No filesystem access happens here.
    pub fn resolve(&self, raw_path: &str) -> Result<ResolvedLocation, PathEscapeError> {
        let segments = normalize_segments(raw_path, self.strict_traversal).ok_or_else(|| {
            warn!("Traversal above storage root rejected: {:?}", raw_path);
            PathEscapeError::new(raw_path)
        })?;

        let mut real_path = self.root.clone();
        for segment in &segments {
            real_path.push(segment);
        }

        if !is_within_root(&self.root, &real_path) {
            warn!(
                "Resolved path {} escapes storage root {} (input: {:?})",
                real_path.display(),
                self.root.display(),
                raw_path
            );
            return Err(PathEscapeError::new(raw_path));
        }

        Ok(ResolvedLocation::new(real_path, segments.join("/")))
    }

    /// Resolves `name` relative to `directory`.
    ///
    /// The name goes through the same normalization as any other input, so a
    /// name with separators or `..` cannot leave the root either.
    pub fn resolve_child(
        &self,
        directory: &ResolvedLocation,
        name: &str,
    ) -> Result<ResolvedLocation, PathEscapeError> {
        self.resolve(&format!("{}/{}", directory.relative_path(), name))
    }

    /// Follows symlinks on the target and checks that it still lands inside
    /// the root.
    ///
    /// A target that does not exist yet is judged by its deepest existing
    /// ancestor, so a new entry under a symlinked directory is caught too.
    pub fn confine_existing(&self, location: &ResolvedLocation) -> Result<(), PathEscapeError> {
        let canonical = location
            .real_path()
            .ancestors()
            .take_while(|ancestor| ancestor.starts_with(&self.root))
            .find_map(|ancestor| ancestor.canonicalize().ok());

        match canonical {
            Some(canonical) if !is_within_root(&self.root, &canonical) => {
                warn!(
                    "Symlink escape blocked: /{} -> {}",
                    location.relative_path(),
                    canonical.display()
                );
                Err(PathEscapeError::new(location.relative_path()))
            }
            _ => Ok(()),
        }
    }
}

/// Returns true if `candidate` is `root` or a descendant of it.
///
/// Comparison is per component, so `/storage2` is not inside `/storage`.
pub fn is_within_root(root: &Path, candidate: &Path) -> bool {
    candidate.strip_prefix(root).is_ok_and(|rest| {
        rest.components()
            .all(|component| matches!(component, Component::Normal(_)))
    })
}

/// Lexically normalizes `raw` as a root-relative path.
///
/// Returns `None` only in strict mode, when `..` climbs above the root.
fn normalize_segments(raw: &str, strict: bool) -> Option<Vec<&str>> {
    let mut segments = Vec::new();

    for segment in raw.split(|c: char| c == '/' || std::path::is_separator(c)) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() && strict {
                    return None;
                }
            }
            name => segments.push(name),
        }
    }

    Some(segments)
}
