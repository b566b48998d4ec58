// crates/orgvault-backup/src/config.rs
// ============================================================================
// Module: Backup Config
// Description: Configuration for the backup pipeline and catalog.
// Purpose: Carry the backup directory and optional blob tree root.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Deserializable configuration embedded by the `orgvault-config` crate.
//! The backup directory holds final archives and the append-only run log;
//! the blob root is the uploaded-files tree included in each run when it
//! exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::BackupError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the append-only backup run log.
const RUN_LOG_FILE: &str = "backup.log";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the backup pipeline.
///
/// # Invariants
/// - `backup_dir` must be a non-empty path; it is created on first run.
/// - `blob_root` may point at a directory that does not exist yet; absence
///   skips the blob artifact without error.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Directory receiving final archives and the run log.
    pub backup_dir: PathBuf,
    /// Optional root of the shared uploaded-files tree.
    #[serde(default)]
    pub blob_root: Option<PathBuf>,
}

impl BackupConfig {
    /// Returns a config rooted at `backup_dir` with no blob tree.
    #[must_use]
    pub fn rooted_at(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            blob_root: None,
        }
    }

    /// Validates field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when `backup_dir` is empty.
    pub fn validate(&self) -> Result<(), BackupError> {
        if self.backup_dir.as_os_str().is_empty() {
            return Err(BackupError::Io("backup_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns the path of the append-only run log.
    #[must_use]
    pub fn run_log_path(&self) -> PathBuf {
        self.backup_dir.join(RUN_LOG_FILE)
    }
}
