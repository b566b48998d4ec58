// crates/orgvault-store-sqlite/src/handle.rs
// ============================================================================
// Module: Store Handle
// Description: Open connection to one embedded store file plus hot-copy
//              snapshots.
// Purpose: Give callers serialized access to a store without exposing
//          connection lifetime management.
// Dependencies: orgvault-core, rusqlite
// ============================================================================

//! ## Overview
//! A [`StoreHandle`] wraps the single open connection to one store file.
//! Handles are shared as `Arc<StoreHandle>`; the handle cache (or the
//! manager, for the shared store) is the owner, and the connection closes
//! when the owner drops its entry. Callers run statements through
//! [`StoreHandle::connection`] and never close the handle themselves.
//!
//! Snapshots use the engine's online backup API, producing a consistent
//! point-in-time copy of a store that may have live readers and writers;
//! a raw file copy of an open WAL store would not be consistent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use orgvault_core::StoreError;
use orgvault_core::TenantKey;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::backup::Backup;

use crate::config::StoreManagerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Pages copied per backup step.
const SNAPSHOT_PAGES_PER_STEP: std::os::raw::c_int = 128;
/// Pause between backup steps, letting writers interleave.
const SNAPSHOT_STEP_PAUSE: Duration = Duration::from_millis(25);

// ============================================================================
// SECTION: Store Handle
// ============================================================================

/// Open handle to one embedded store file.
///
/// # Invariants
/// - Exactly one handle per store file exists at a time; the cache (or the
///   manager for the shared store) enforces this, not the engine.
/// - All statement execution is serialized through the connection mutex.
#[derive(Debug)]
pub struct StoreHandle {
    /// Tenant owning this store; `None` for the shared store.
    tenant: Option<TenantKey>,
    /// Path of the underlying store file.
    path: PathBuf,
    /// The open connection, serialized by a mutex.
    connection: Mutex<Connection>,
}

impl StoreHandle {
    /// Opens the store file at `path`, creating it when `create` is set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be opened or pragmas
    /// cannot be applied.
    pub(crate) fn open(
        config: &StoreManagerConfig,
        path: PathBuf,
        tenant: Option<TenantKey>,
        create: bool,
    ) -> Result<Self, StoreError> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let connection = Connection::open_with_flags(&path, flags)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        Ok(Self {
            tenant,
            path,
            connection: Mutex::new(connection),
        })
    }

    /// Returns the tenant this handle belongs to, if any.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantKey> {
        self.tenant.as_ref()
    }

    /// Returns the path of the underlying store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locks and returns the store connection.
    ///
    /// The guard serializes all access to this store; hold it only for the
    /// duration of one logical operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the connection mutex is poisoned.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Io("store connection mutex poisoned".to_string()))
    }

    /// Writes a consistent point-in-time copy of this store to `dest`.
    ///
    /// The connection lock is held for the duration, so the copy reflects a
    /// single instant of this store; other tenants are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the destination cannot be created or the
    /// online copy fails.
    pub fn snapshot_to(&self, dest: &Path) -> Result<(), StoreError> {
        let guard = self.connection()?;
        let mut target =
            Connection::open(dest).map_err(|err| StoreError::Io(err.to_string()))?;
        let backup =
            Backup::new(&guard, &mut target).map_err(|err| StoreError::Db(err.to_string()))?;
        backup
            .run_to_completion(SNAPSHOT_PAGES_PER_STEP, SNAPSHOT_STEP_PAUSE, None)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(connection: &Connection, config: &StoreManagerConfig) -> Result<(), StoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(config.busy_timeout())
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(())
}
