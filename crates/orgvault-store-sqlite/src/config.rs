// crates/orgvault-store-sqlite/src/config.rs
// ============================================================================
// Module: Store Manager Config
// Description: Configuration model for the tenant store manager.
// Purpose: Carry paths, SQLite pragmas, and cache bounds with validation.
// Dependencies: orgvault-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Deserializable configuration consumed by [`crate::manager::StoreManager`].
//! The `orgvault-config` crate embeds this struct in the top-level TOML
//! model; validation lives here so embedded and programmatic construction
//! share the same guards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use orgvault_core::StoreError;
use orgvault_core::TenantKey;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default bound on concurrently open tenant handles.
const DEFAULT_MAX_OPEN_HANDLES: usize = 16;
/// Default idle threshold before a cached handle becomes evictable (ms).
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;
/// File name of the shared cross-tenant store.
const SHARED_STORE_FILE: &str = "shared.db";
/// Directory holding per-tenant store files, relative to `data_dir`.
const TENANT_STORE_DIR: &str = "tenants";

// ============================================================================
// SECTION: Pragma Modes
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

// ============================================================================
// SECTION: Cache Settings
// ============================================================================

/// Bounds for the tenant handle cache.
///
/// # Invariants
/// - `max_open` must be greater than zero.
/// - `idle_timeout_ms` must be greater than zero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of concurrently open tenant handles.
    #[serde(default = "default_max_open")]
    pub max_open: usize,
    /// Idle threshold after which a cached handle becomes evictable (ms).
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

/// Returns the default open-handle bound.
const fn default_max_open() -> usize {
    DEFAULT_MAX_OPEN_HANDLES
}

/// Returns the default idle threshold in milliseconds.
const fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the tenant store manager.
///
/// # Invariants
/// - `data_dir` must be a non-empty path; it is created on first open.
/// - `busy_timeout_ms` is interpreted as milliseconds and must be non-zero.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreManagerConfig {
    /// Root directory holding the shared store and the tenant store tree.
    pub data_dir: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Handle cache bounds.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreManagerConfig {
    /// Returns a config with defaults rooted at `data_dir`.
    #[must_use]
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            cache: CacheSettings::default(),
        }
    }

    /// Validates field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when a field is out of range.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Invalid("data_dir must not be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(StoreError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.cache.max_open == 0 {
            return Err(StoreError::Invalid(
                "cache.max_open must be greater than zero".to_string(),
            ));
        }
        if self.cache.idle_timeout_ms == 0 {
            return Err(StoreError::Invalid(
                "cache.idle_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the path of the shared cross-tenant store file.
    #[must_use]
    pub fn shared_store_path(&self) -> PathBuf {
        self.data_dir.join(SHARED_STORE_FILE)
    }

    /// Returns the directory holding per-tenant store files.
    #[must_use]
    pub fn tenant_store_dir(&self) -> PathBuf {
        self.data_dir.join(TENANT_STORE_DIR)
    }

    /// Returns the store file path for one tenant.
    ///
    /// The key's validated charset guarantees the result stays inside the
    /// tenant store directory.
    #[must_use]
    pub fn tenant_store_path(&self, tenant: &TenantKey) -> PathBuf {
        self.tenant_store_dir().join(format!("{}.db", tenant.as_str()))
    }

    /// Returns the busy timeout as a [`std::time::Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.busy_timeout_ms)
    }

    /// Returns the idle threshold as a [`std::time::Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cache.idle_timeout_ms)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use orgvault_core::StoreError;
    use orgvault_core::TenantKey;

    use super::StoreManagerConfig;

    #[test]
    fn tenant_paths_stay_under_tenant_dir() {
        let config = StoreManagerConfig::rooted_at("/var/lib/orgvault");
        let path = TenantKey::new("north").map(|key| config.tenant_store_path(&key));
        assert_eq!(path.as_deref().ok(), Some(Path::new("/var/lib/orgvault/tenants/north.db")));
    }

    #[test]
    fn validate_rejects_zero_bounds() {
        let mut config = StoreManagerConfig::rooted_at("/tmp/orgvault");
        config.cache.max_open = 0;
        assert!(matches!(config.validate(), Err(StoreError::Invalid(_))));
        let mut config = StoreManagerConfig::rooted_at("/tmp/orgvault");
        config.cache.idle_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(StoreError::Invalid(_))));
        let mut config = StoreManagerConfig::rooted_at("/tmp/orgvault");
        config.busy_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(StoreError::Invalid(_))));
    }
}
