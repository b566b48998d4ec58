// crates/orgvault-backup/src/orchestrator.rs
// ============================================================================
// Module: Backup Orchestrator
// Description: One-run fan-out over the shared store, tenant stores, and
//              the blob tree.
// Purpose: Produce a single consistent archive per run while tolerating
//          individual tenant failures.
// Dependencies: orgvault-core, orgvault-store-sqlite, flate2, tar, time,
//               tracing
// ============================================================================

//! ## Overview
//! A run snapshots the shared store first (fatal on failure), then every
//! active tenant independently (failures logged and skipped), then packages
//! the blob tree when it exists. Artifacts are staged in a per-run working
//! directory and assembled into the final archive only after all snapshot
//! attempts completed, so consumers only ever see fully-formed archives.
//!
//! Each tenant is copied at its own instant; a run spanning several minutes
//! has no cross-tenant point-in-time guarantee. That is an accepted
//! tradeoff of the sequential fan-out, not a defect.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use orgvault_core::Capability;
use orgvault_core::TenantDirectory;
use orgvault_store_sqlite::StoreManager;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::archive::ArchiveSink;
use crate::catalog::download_locator;
use crate::config::BackupConfig;
use crate::error::BackupError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Format of the per-run timestamp token embedded in artifact names.
const RUN_TOKEN_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second][subsecond digits:3]");
/// Base name of the blob tree inside its archive segment.
const BLOB_TREE_NAME: &str = "blobs";

// ============================================================================
// SECTION: Results
// ============================================================================

/// One produced snapshot artifact awaiting packaging.
#[derive(Debug, Clone)]
struct ArtifactEntry {
    /// Base name of the artifact inside the final archive.
    name: String,
    /// Staged source path in the working directory.
    source: PathBuf,
    /// Artifact size in bytes.
    size_bytes: u64,
}

/// Result of one successful backup run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BackupReport {
    /// File name of the produced archive.
    pub archive_name: String,
    /// Number of artifacts included in the archive.
    pub artifact_count: usize,
    /// Absolute path of the archive in the backup directory.
    pub archive_path: PathBuf,
    /// Retrievable download locator for the archive.
    pub download: String,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives one backup run over every store plus the blob tree.
///
/// # Invariants
/// - The mandatory shared-store snapshot precedes all tenant snapshots.
/// - Per-tenant failures never abort a run.
#[derive(Debug)]
pub struct BackupOrchestrator {
    /// The store manager supplying handles and the tenant registry.
    manager: Arc<StoreManager>,
    /// Pipeline configuration.
    config: BackupConfig,
}

impl BackupOrchestrator {
    /// Creates an orchestrator over `manager`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] when the configuration is invalid.
    pub fn new(manager: Arc<StoreManager>, config: BackupConfig) -> Result<Self, BackupError> {
        config.validate()?;
        Ok(Self {
            manager,
            config,
        })
    }

    /// Runs one backup, producing a single archive in the backup directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Forbidden`] before any I/O when the caller is
    /// not a privileged operator, [`BackupError::BackupFailed`] when the
    /// run produced no usable artifacts (including a failed shared-store
    /// snapshot), and [`BackupError::Io`] on packaging failures.
    pub fn run_backup(&self, capability: &Capability) -> Result<BackupReport, BackupError> {
        if !capability.is_privileged_operator() {
            return Err(BackupError::Forbidden);
        }
        let token = run_token()?;
        let work_dir = self.config.backup_dir.join(format!("work-{token}"));
        std::fs::create_dir_all(&work_dir).map_err(|err| {
            BackupError::BackupFailed(format!("backup working directory unavailable: {err}"))
        })?;
        let result = self.run_in(&token, &work_dir);
        if let Err(err) = std::fs::remove_dir_all(&work_dir) {
            tracing::warn!(error = %err, "backup working directory not removed");
        }
        result
    }

    /// Executes the snapshot fan-out and packaging inside the working
    /// directory.
    fn run_in(&self, token: &str, work_dir: &Path) -> Result<BackupReport, BackupError> {
        let mut artifacts: Vec<ArtifactEntry> = Vec::new();

        // Mandatory shared-store snapshot; without it the archive is useless.
        let shared_name = format!("shared-{token}.db");
        let shared_path = work_dir.join(&shared_name);
        self.manager.main_store().snapshot_to(&shared_path).map_err(|err| {
            BackupError::BackupFailed(format!("shared store snapshot failed: {err}"))
        })?;
        match stat_artifact(shared_name, shared_path) {
            Ok(entry) => artifacts.push(entry),
            Err(err) => {
                return Err(BackupError::BackupFailed(format!(
                    "shared store snapshot unreadable: {err}"
                )));
            }
        }

        let tenants = self.manager.active_tenants().map_err(|err| {
            BackupError::BackupFailed(format!("tenant registry unavailable: {err}"))
        })?;
        for tenant in tenants {
            let name = format!("tenant-{tenant}-{token}.db");
            let path = work_dir.join(&name);
            let outcome = self
                .manager
                .tenant_store(&tenant)
                .map_err(BackupError::from)
                .and_then(|handle| handle.snapshot_to(&path).map_err(BackupError::from))
                .and_then(|()| stat_artifact(name, path));
            match outcome {
                Ok(entry) => artifacts.push(entry),
                Err(err) => {
                    tracing::warn!(tenant = %tenant, error = %err, "tenant snapshot skipped");
                }
            }
        }

        if let Some(blob_root) = self.config.blob_root.as_deref()
            && blob_root.is_dir()
        {
            let name = format!("blobs-{token}.tar.gz");
            let path = work_dir.join(&name);
            match compress_tree(blob_root, &path).and_then(|()| stat_artifact(name, path)) {
                Ok(entry) => artifacts.push(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "blob tree archive skipped");
                }
            }
        }

        if artifacts.is_empty() {
            return Err(BackupError::BackupFailed("no artifacts produced".to_string()));
        }

        let archive_name = format!("orgvault-backup-{token}.tar.gz");
        let mut sink = ArchiveSink::create(&self.config.backup_dir, &archive_name)?;
        for artifact in &artifacts {
            sink.append_file(&artifact.name, &artifact.source)?;
        }
        let archive_path = sink.finish()?;
        let archive_path = std::fs::canonicalize(&archive_path).unwrap_or(archive_path);

        if let Err(err) = self.append_run_log(token, &archive_name, &artifacts) {
            tracing::warn!(error = %err, "backup run log not written");
        }
        let staged_bytes: u64 = artifacts.iter().map(|artifact| artifact.size_bytes).sum();
        tracing::info!(
            archive = %archive_name,
            artifacts = artifacts.len(),
            staged_bytes,
            "backup run completed"
        );

        Ok(BackupReport {
            download: download_locator(&archive_name),
            artifact_count: artifacts.len(),
            archive_path,
            archive_name,
        })
    }

    /// Appends one line describing the run to the append-only text log.
    fn append_run_log(
        &self,
        token: &str,
        archive_name: &str,
        artifacts: &[ArtifactEntry],
    ) -> Result<(), BackupError> {
        let names: Vec<&str> = artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
        let line = format!(
            "{token} {archive_name} artifacts={} [{}]\n",
            artifacts.len(),
            names.join(", ")
        );
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.run_log_path())?;
        log.write_all(line.as_bytes())?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats the per-run timestamp token.
fn run_token() -> Result<String, BackupError> {
    OffsetDateTime::now_utc()
        .format(RUN_TOKEN_FORMAT)
        .map_err(|err| BackupError::Io(format!("run token formatting failed: {err}")))
}

/// Stats one staged artifact file.
fn stat_artifact(name: String, source: PathBuf) -> Result<ArtifactEntry, BackupError> {
    let metadata = std::fs::metadata(&source)?;
    Ok(ArtifactEntry {
        name,
        source,
        size_bytes: metadata.len(),
    })
}

/// Packages a directory tree into a compressed archive segment.
fn compress_tree(root: &Path, dest: &Path) -> Result<(), BackupError> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(BLOB_TREE_NAME, root)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?.sync_all()?;
    Ok(())
}
