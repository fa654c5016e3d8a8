//! Storage operations
//!
//! Implements the drive's filesystem operations. Every entry point takes a
//! [`ResolvedLocation`]; names supplied alongside a location are resolved
//! through the same [`PathResolver`] before use.

use std::fs;
use std::io::{self, Read};

use log::{debug, error, info};

use crate::error::{PathEscapeError, StorageError};
use crate::navigate::{PathResolver, ResolvedLocation};
use crate::storage::filesystem::{
    clear_directory, directory_exists, file_exists, retry_on_permission_denied, write_via_temp,
};
use crate::storage::results::{DirectoryListing, ListOutcome};

/// Filesystem operations confined to a single storage root
#[derive(Debug, Clone)]
pub struct StorageOperations {
    resolver: PathResolver,
}

impl StorageOperations {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Shorthand for [`PathResolver::resolve`]
    pub fn resolve(&self, raw_path: &str) -> Result<ResolvedLocation, PathEscapeError> {
        self.resolver.resolve(raw_path)
    }

    /// Lists the immediate children of a directory.
    ///
    /// A regular file yields [`ListOutcome::ServeFile`] instead of a listing.
    /// Children that are neither directories nor regular files are skipped.
    pub fn list(&self, location: &ResolvedLocation) -> Result<ListOutcome, StorageError> {
        self.resolver.confine_existing(location)?;
        let real_path = location.real_path();

        if file_exists(real_path) {
            debug!("/{} is a file, serving it", location.relative_path());
            return Ok(ListOutcome::ServeFile(location.clone()));
        }

        let entries = fs::read_dir(real_path)
            .map_err(|e| StorageError::from_io(e, location.relative_path()))?;

        let mut folders = Vec::new();
        let mut files = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            if directory_exists(&path) {
                folders.push(name);
            } else if file_exists(&path) {
                files.push(name);
            }
        }
        folders.sort();
        files.sort();

        debug!(
            "Listed /{} (real: {}) - {} folders, {} files",
            location.relative_path(),
            real_path.display(),
            folders.len(),
            files.len()
        );

        Ok(ListOutcome::Listing(DirectoryListing {
            current_path: location.relative_path().to_string(),
            parent_path: location.parent_relative_path().map(str::to_string),
            folders,
            files,
        }))
    }

    /// Creates folder `name` inside `location`.
    ///
    /// An empty name, or a target that already exists, is a no-op.
    pub fn create_folder(&self, location: &ResolvedLocation, name: &str) -> Result<(), StorageError> {
        if name.is_empty() {
            return Ok(());
        }

        self.resolver.confine_existing(location)?;
        let target = self.resolver.resolve_child(location, name)?;
        self.resolver.confine_existing(&target)?;

        match fs::create_dir(target.real_path()) {
            Ok(()) => {
                info!(
                    "Created folder /{} (real: {})",
                    target.relative_path(),
                    target.real_path().display()
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Folder /{} already exists", target.relative_path());
                Ok(())
            }
            Err(e) => {
                error!("Failed to create folder /{}: {}", target.relative_path(), e);
                Err(StorageError::from_io(e, location.relative_path()))
            }
        }
    }

    /// Removes a regular file. Missing targets and directories are left alone.
    pub fn delete_file(&self, location: &ResolvedLocation) -> Result<(), StorageError> {
        self.resolver.confine_existing(location)?;
        let real_path = location.real_path();

        if !file_exists(real_path) {
            debug!("No file at /{}, nothing to delete", location.relative_path());
            return Ok(());
        }

        match retry_on_permission_denied(|| fs::remove_file(real_path)) {
            Ok(()) => {
                info!(
                    "Deleted file /{} (real: {})",
                    location.relative_path(),
                    real_path.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to delete file /{}: {}", location.relative_path(), e);
                Err(e.into())
            }
        }
    }

    /// Recursively removes a directory and everything under it.
    ///
    /// Anything other than an existing directory is left alone. For the root,
    /// its contents are removed but the root directory itself stays.
    pub fn delete_folder(&self, location: &ResolvedLocation) -> Result<(), StorageError> {
        self.resolver.confine_existing(location)?;
        let real_path = location.real_path();

        if !directory_exists(real_path) {
            debug!("No folder at /{}, nothing to delete", location.relative_path());
            return Ok(());
        }

        let result = if location.is_root() {
            clear_directory(real_path)
        } else {
            retry_on_permission_denied(|| fs::remove_dir_all(real_path))
        };

        match result {
            Ok(()) => {
                info!(
                    "Deleted folder /{} (real: {})",
                    location.relative_path(),
                    real_path.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to delete folder /{}: {}", location.relative_path(), e);
                Err(e.into())
            }
        }
    }

    /// Writes `content` to `filename` inside `location`, replacing any file of
    /// that name. An empty filename is a no-op.
    pub fn save_upload<R: Read>(
        &self,
        location: &ResolvedLocation,
        filename: &str,
        mut content: R,
    ) -> Result<(), StorageError> {
        if filename.is_empty() {
            return Ok(());
        }

        self.resolver.confine_existing(location)?;
        let target = self.resolver.resolve_child(location, filename)?;
        self.resolver.confine_existing(&target)?;

        if directory_exists(target.real_path()) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("/{} is a directory", target.relative_path()),
            )));
        }

        match write_via_temp(target.real_path(), &mut content) {
            Ok(bytes) => {
                info!(
                    "Stored upload /{} (real: {}) - {} bytes",
                    target.relative_path(),
                    target.real_path().display(),
                    bytes
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to store upload /{}: {}", target.relative_path(), e);
                Err(StorageError::from_io(e, location.relative_path()))
            }
        }
    }

    /// Returns the location if it is an existing regular file.
    pub fn resolve_for_download(
        &self,
        location: &ResolvedLocation,
    ) -> Result<ResolvedLocation, StorageError> {
        self.resolver.confine_existing(location)?;

        if !file_exists(location.real_path()) {
            return Err(StorageError::NotFound(location.relative_path().to_string()));
        }

        debug!("Prepared download of /{}", location.relative_path());
        Ok(location.clone())
    }
}
