//! Configuration management for RAX Drive
//!
//! Values come from built-in defaults, then an optional `config.toml` in the
//! working directory, then `RAX_DRIVE_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config";
const ENV_PREFIX: &str = "RAX_DRIVE";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8090;
const DEFAULT_STORAGE_ROOT: &str = "storage";
const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 1024;

/// Server configuration; every field requires a restart to take effect
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to
    /// Environment: RAX_DRIVE_BIND_ADDRESS
    pub bind_address: String,

    /// Environment: RAX_DRIVE_PORT
    pub port: u16,

    /// Directory holding all stored files, created at startup
    /// Environment: RAX_DRIVE_STORAGE_ROOT
    pub storage_root: String,

    /// Maximum request body size for uploads
    /// Environment: RAX_DRIVE_MAX_UPLOAD_SIZE_MB
    pub max_upload_size_mb: u64,

    /// Reject `..` that climbs above the root instead of clamping it
    /// Environment: RAX_DRIVE_STRICT_TRAVERSAL
    pub strict_traversal: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            max_upload_size_mb: DEFAULT_MAX_UPLOAD_SIZE_MB,
            strict_traversal: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from ./config.toml (if present) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from `config_path` (extension optional) with
    /// environment overrides. A missing file falls back to the defaults.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("storage_root", DEFAULT_STORAGE_ROOT)?
            .set_default("max_upload_size_mb", DEFAULT_MAX_UPLOAD_SIZE_MB as i64)?
            .set_default("strict_traversal", false)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Upload limit in bytes, saturating on platforms where it overflows `usize`
    pub fn max_upload_size_bytes(&self) -> usize {
        usize::try_from(self.max_upload_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}
