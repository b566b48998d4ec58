// crates/orgvault-backup/src/catalog.rs
// ============================================================================
// Module: Backup Catalog
// Description: Listing, deletion, and download of produced archives.
// Purpose: Expose the backup directory as an immutable archive catalog.
// Dependencies: orgvault-core, serde
// ============================================================================

//! ## Overview
//! The catalog treats archives as read-only once produced; deletion by
//! sanitized filename is the only mutation. Every filename coming from a
//! caller passes [`sanitize_filename`] before any path is built; a name
//! containing a separator or a parent reference is rejected without
//! touching the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use orgvault_core::Capability;

use crate::config::BackupConfig;
use crate::error::BackupError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of final archive file names.
const ARCHIVE_PREFIX: &str = "orgvault-backup-";
/// Suffix of final archive file names.
const ARCHIVE_SUFFIX: &str = ".tar.gz";

// ============================================================================
// SECTION: Catalog Entries
// ============================================================================

/// One archive visible in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BackupEntry {
    /// Archive file name.
    pub file_name: String,
    /// Archive size in bytes.
    pub size_bytes: u64,
    /// Creation time in unix milliseconds.
    pub created_at_ms: i64,
    /// Last modification time in unix milliseconds.
    pub modified_at_ms: i64,
    /// Retrievable download locator.
    pub download: String,
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog over the backup directory.
///
/// # Invariants
/// - Only sanitized filenames ever reach a filesystem call.
/// - Archives are never modified, only removed.
#[derive(Debug)]
pub struct BackupCatalog {
    /// Pipeline configuration carrying the backup directory.
    config: BackupConfig,
}

impl BackupCatalog {
    /// Creates a catalog over the configured backup directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] when the configuration is invalid.
    pub fn new(config: BackupConfig) -> Result<Self, BackupError> {
        config.validate()?;
        Ok(Self {
            config,
        })
    }

    /// Lists all archives, newest first.
    ///
    /// A missing or empty backup directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Forbidden`] for unprivileged callers and
    /// [`BackupError::Io`] when the directory cannot be read.
    pub fn list(&self, capability: &Capability) -> Result<Vec<BackupEntry>, BackupError> {
        if !capability.is_privileged_operator() {
            return Err(BackupError::Forbidden);
        }
        let reader = match std::fs::read_dir(&self.config.backup_dir) {
            Ok(reader) => reader,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(BackupError::Io(err.to_string())),
        };
        let mut entries = Vec::new();
        for item in reader {
            let item = item.map_err(|err| BackupError::Io(err.to_string()))?;
            let Ok(file_name) = item.file_name().into_string() else {
                continue;
            };
            if !is_archive_name(&file_name) {
                continue;
            }
            let metadata = item.metadata().map_err(|err| BackupError::Io(err.to_string()))?;
            if !metadata.is_file() {
                continue;
            }
            let modified_at_ms = system_time_millis(metadata.modified().ok());
            let created_at_ms = match metadata.created() {
                Ok(created) => system_time_millis(Some(created)),
                // Some filesystems expose no birth time; fall back to mtime.
                Err(_) => modified_at_ms,
            };
            entries.push(BackupEntry {
                download: download_locator(&file_name),
                size_bytes: metadata.len(),
                created_at_ms,
                modified_at_ms,
                file_name,
            });
        }
        entries.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(entries)
    }

    /// Deletes one archive by file name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Forbidden`] for unprivileged callers,
    /// [`BackupError::InvalidFilename`] before any filesystem call when the
    /// name carries a separator or parent reference, and
    /// [`BackupError::NotFound`] when no such archive exists.
    pub fn delete(&self, capability: &Capability, file_name: &str) -> Result<(), BackupError> {
        if !capability.is_privileged_operator() {
            return Err(BackupError::Forbidden);
        }
        let path = self.resolve(file_name)?;
        if !path.is_file() {
            return Err(BackupError::NotFound(file_name.to_string()));
        }
        std::fs::remove_file(&path).map_err(|err| BackupError::Io(err.to_string()))
    }

    /// Opens one archive for streaming by file name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidFilename`] before any filesystem call
    /// when the name carries a separator or parent reference, and
    /// [`BackupError::NotFound`] when no such archive exists.
    pub fn download(&self, file_name: &str) -> Result<File, BackupError> {
        let path = self.resolve(file_name)?;
        match File::open(&path) {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BackupError::NotFound(file_name.to_string()))
            }
            Err(err) => Err(BackupError::Io(err.to_string())),
        }
    }

    /// Sanitizes a caller-supplied name and joins it onto the backup
    /// directory.
    fn resolve(&self, file_name: &str) -> Result<PathBuf, BackupError> {
        sanitize_filename(file_name)?;
        Ok(self.config.backup_dir.join(file_name))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects names that could escape the backup directory.
///
/// # Errors
///
/// Returns [`BackupError::InvalidFilename`] for empty names, names with a
/// path separator, or names containing a parent reference.
pub(crate) fn sanitize_filename(file_name: &str) -> Result<(), BackupError> {
    if file_name.is_empty() {
        return Err(BackupError::InvalidFilename("empty filename".to_string()));
    }
    if file_name.chars().any(std::path::is_separator)
        || file_name.contains('/')
        || file_name.contains('\\')
    {
        return Err(BackupError::InvalidFilename(
            "filename must not contain path separators".to_string(),
        ));
    }
    if file_name.contains("..") {
        return Err(BackupError::InvalidFilename(
            "filename must not contain parent references".to_string(),
        ));
    }
    Ok(())
}

/// Returns the relative download locator for an archive name.
#[must_use]
pub(crate) fn download_locator(file_name: &str) -> String {
    format!("/backups/{file_name}")
}

/// Returns true for final archive names, excluding staging files.
fn is_archive_name(file_name: &str) -> bool {
    file_name.starts_with(ARCHIVE_PREFIX) && file_name.ends_with(ARCHIVE_SUFFIX)
}

/// Converts a system time to unix milliseconds.
fn system_time_millis(value: Option<SystemTime>) -> i64 {
    let duration = value
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .unwrap_or_default();
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::is_archive_name;
    use super::sanitize_filename;

    #[test]
    fn sanitize_rejects_traversal_attempts() {
        assert!(sanitize_filename("../../etc/passwd").is_err());
        assert!(sanitize_filename("a/b.tar.gz").is_err());
        assert!(sanitize_filename("a\\b.tar.gz").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("").is_err());
    }

    #[test]
    fn sanitize_accepts_plain_archive_names() {
        assert!(sanitize_filename("orgvault-backup-20260101-000000000.tar.gz").is_ok());
    }

    #[test]
    fn staging_files_are_not_archive_names() {
        assert!(is_archive_name("orgvault-backup-20260101-000000000.tar.gz"));
        assert!(!is_archive_name("orgvault-backup-20260101-000000000.tar.gz.partial"));
        assert!(!is_archive_name("backup.log"));
    }
}
