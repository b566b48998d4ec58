// crates/orgvault-config/src/lib.rs
// ============================================================================
// Module: Orgvault Config
// Description: Canonical TOML configuration model with fail-closed loading.
// Purpose: Assemble the storage and backup configuration consumed by the
//          hosting process.
// Dependencies: orgvault-backup, orgvault-store-sqlite, serde, toml,
//               thiserror
// ============================================================================

//! ## Overview
//! One TOML document configures the whole deployment: the `[storage]` table
//! maps to [`StoreManagerConfig`], the `[backup]` table to [`BackupConfig`].
//! Loading is strict and fail-closed: path limits, a file size ceiling, and
//! UTF-8 enforcement are checked before parsing, and every embedded section
//! is range-validated after parsing. An absent path yields the defaults.
//!
//! Security posture: config files are host-trusted input, but the loader
//! still bounds them so a misconfigured path cannot feed unbounded bytes
//! into the parser.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use orgvault_backup::BackupConfig;
use orgvault_store_sqlite::StoreManagerConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1_048_576;
/// Maximum length of a single config path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total config path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default data directory when no config file is supplied.
const DEFAULT_DATA_DIR: &str = "data";
/// Default backup directory when no config file is supplied.
const DEFAULT_BACKUP_DIR: &str = "data/backups";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading errors.
///
/// # Invariants
/// - Messages identify the failed guard without echoing file contents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error reading the config file.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Guard or range validation failure.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Top-level Orgvault configuration.
///
/// # Invariants
/// - Both sections validate their own ranges; a loaded value is usable
///   as-is by the store manager and the backup pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgVaultConfig {
    /// Tenant store manager configuration.
    #[serde(default = "default_storage")]
    pub storage: StoreManagerConfig,
    /// Backup pipeline configuration.
    #[serde(default = "default_backup")]
    pub backup: BackupConfig,
}

impl Default for OrgVaultConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            backup: default_backup(),
        }
    }
}

/// Returns the default storage section.
fn default_storage() -> StoreManagerConfig {
    StoreManagerConfig::rooted_at(DEFAULT_DATA_DIR)
}

/// Returns the default backup section.
fn default_backup() -> BackupConfig {
    BackupConfig::rooted_at(DEFAULT_BACKUP_DIR)
}

impl OrgVaultConfig {
    /// Loads the configuration from `path`, or returns defaults for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path violates length limits, the
    /// file is oversized or not UTF-8, parsing fails, or an embedded
    /// section fails range validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        validate_config_path(path)?;
        let metadata =
            std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let bytes = std::fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every embedded section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a section is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
        self.backup.validate().map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates config path length limits before any filesystem access.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
