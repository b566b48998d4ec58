// crates/orgvault-backup/src/error.rs
// ============================================================================
// Module: Backup Errors
// Description: Error taxonomy for backup runs and the archive catalog.
// Purpose: Keep client-visible conditions distinguishable from server
//          failures.
// Dependencies: orgvault-core, thiserror
// ============================================================================

//! ## Overview
//! `Forbidden`, `InvalidFilename`, and `NotFound` are client errors;
//! `BackupFailed` and `Io` are server errors. A run that produced no usable
//! artifact, including a failed mandatory shared-store snapshot, is
//! always `BackupFailed`, never a partial success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use orgvault_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Backup pipeline errors.
///
/// # Invariants
/// - Messages avoid embedding archive contents or store payloads.
#[derive(Debug, Error, Clone)]
pub enum BackupError {
    /// Caller lacks the privileged-operator capability.
    #[error("backup operation requires a privileged operator")]
    Forbidden,
    /// Filename contained a path separator or parent reference.
    #[error("invalid backup filename: {0}")]
    InvalidFilename(String),
    /// No archive with the given name exists in the catalog.
    #[error("backup archive not found: {0}")]
    NotFound(String),
    /// The run produced no usable artifacts.
    #[error("backup run failed: {0}")]
    BackupFailed(String),
    /// Filesystem error outside the snapshot steps.
    #[error("backup io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackupError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<StoreError> for BackupError {
    fn from(error: StoreError) -> Self {
        Self::Io(error.to_string())
    }
}
