// crates/orgvault-store-sqlite/src/cache.rs
// ============================================================================
// Module: Store Handle Cache
// Description: Bounded map of tenant key to open store handle.
// Purpose: Be the single owner of tenant handle lifetime and bound the
//          number of concurrently open stores.
// Dependencies: orgvault-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! The cache is the only code path that opens or closes tenant store
//! handles. `get` treats "check cache, else open + initialize + insert" as
//! atomic per tenant key: a per-key open lock serializes first access to one
//! tenant so two writable handles are never opened for the same store file,
//! while unrelated tenants proceed concurrently.
//!
//! Eviction is lazy and pull-triggered: only an insert that would exceed the
//! configured bound scans for idle entries. Idle handles linger until the
//! next at-capacity insert; nothing closes them on a timer. When no entry is
//! idle past the threshold the new entry is still admitted, so the bound is
//! a target under sustained load on many distinct tenants rather than a hard
//! ceiling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Instant;

use orgvault_core::StoreError;
use orgvault_core::TenantKey;

use crate::config::StoreManagerConfig;
use crate::handle::StoreHandle;
use crate::schema;

// ============================================================================
// SECTION: Cache Entry
// ============================================================================

/// One cached handle plus its last access time.
///
/// # Invariants
/// - `last_access` is refreshed on every cache hit.
#[derive(Debug)]
struct CacheEntry {
    /// The open handle, shared with current borrowers.
    handle: Arc<StoreHandle>,
    /// Time of the most recent `get` for this tenant.
    last_access: Instant,
}

// ============================================================================
// SECTION: Handle Cache
// ============================================================================

/// Bounded tenant handle cache with lazy idle eviction.
///
/// # Invariants
/// - At most one open handle per tenant key exists at any time.
/// - Entries are closed only by eviction, `disconnect`, or `disconnect_all`.
#[derive(Debug)]
pub struct HandleCache {
    /// Manager configuration (paths, pragmas, bounds).
    config: StoreManagerConfig,
    /// Live entries keyed by tenant.
    entries: Mutex<HashMap<TenantKey, CacheEntry>>,
    /// Per-tenant locks serializing the check-open-insert critical section.
    open_locks: Mutex<HashMap<TenantKey, Arc<Mutex<()>>>>,
}

impl HandleCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: StoreManagerConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            open_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the tenant's handle, opening its store on first access.
    ///
    /// A hit refreshes the entry's last-access time. A miss requires the
    /// store file to already exist; provisioning is a separate operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotProvisioned`] when the store file does not
    /// exist, and other [`StoreError`] variants when open or schema
    /// initialization fails.
    pub fn get(&self, tenant: &TenantKey) -> Result<Arc<StoreHandle>, StoreError> {
        if let Some(handle) = self.lookup(tenant)? {
            return Ok(handle);
        }
        let open_lock = self.open_lock(tenant)?;
        let _serialized = open_lock
            .lock()
            .map_err(|_| StoreError::Io("tenant open mutex poisoned".to_string()))?;
        // A racing caller may have opened the store while this one waited.
        if let Some(handle) = self.lookup(tenant)? {
            return Ok(handle);
        }
        let path = self.config.tenant_store_path(tenant);
        if !path.is_file() {
            return Err(StoreError::NotProvisioned(tenant.clone()));
        }
        let handle = StoreHandle::open(&self.config, path, Some(tenant.clone()), false)?;
        initialize_tenant_handle(&handle)?;
        let handle = Arc::new(handle);
        self.insert(tenant.clone(), Arc::clone(&handle))?;
        Ok(handle)
    }

    /// Creates and initializes a new on-disk store for `tenant`.
    ///
    /// The handle is returned without being inserted into the cache;
    /// checking that the tenant does not already exist is the caller's
    /// business-layer responsibility. The per-key lock is still taken so a
    /// provision cannot race a concurrent first `get` into a double open.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store directory or file cannot be
    /// created, or schema initialization fails.
    pub fn provision(&self, tenant: &TenantKey) -> Result<Arc<StoreHandle>, StoreError> {
        let open_lock = self.open_lock(tenant)?;
        let _serialized = open_lock
            .lock()
            .map_err(|_| StoreError::Io("tenant open mutex poisoned".to_string()))?;
        let path = self.config.tenant_store_path(tenant);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        let handle = StoreHandle::open(&self.config, path, Some(tenant.clone()), true)?;
        initialize_tenant_handle(&handle)?;
        Ok(Arc::new(handle))
    }

    /// Closes and removes one entry; no-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the cache mutex is poisoned.
    pub fn disconnect(&self, tenant: &TenantKey) -> Result<bool, StoreError> {
        let mut entries = self.lock_entries()?;
        Ok(entries.remove(tenant).is_some())
    }

    /// Closes and removes every entry; used at process shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the cache mutex is poisoned.
    pub fn disconnect_all(&self) -> Result<(), StoreError> {
        let mut entries = self.lock_entries()?;
        entries.clear();
        Ok(())
    }

    /// Returns the number of live entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the cache mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock_entries()?.len())
    }

    /// Returns true when the cache holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the cache mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock_entries()?.is_empty())
    }

    /// Looks up a cached handle, refreshing its last-access time.
    fn lookup(&self, tenant: &TenantKey) -> Result<Option<Arc<StoreHandle>>, StoreError> {
        let mut entries = self.lock_entries()?;
        Ok(entries.get_mut(tenant).map(|entry| {
            entry.last_access = Instant::now();
            Arc::clone(&entry.handle)
        }))
    }

    /// Inserts a fresh entry, evicting idle entries when at the bound.
    fn insert(&self, tenant: TenantKey, handle: Arc<StoreHandle>) -> Result<(), StoreError> {
        let mut entries = self.lock_entries()?;
        if entries.len() >= self.config.cache.max_open {
            evict_idle(&mut entries, &self.config);
        }
        entries.insert(
            tenant,
            CacheEntry {
                handle,
                last_access: Instant::now(),
            },
        );
        Ok(())
    }

    /// Returns the per-tenant open lock, creating it on first use.
    fn open_lock(&self, tenant: &TenantKey) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self
            .open_locks
            .lock()
            .map_err(|_| StoreError::Io("open-lock table mutex poisoned".to_string()))?;
        Ok(Arc::clone(
            locks.entry(tenant.clone()).or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// Locks the entry table.
    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<TenantKey, CacheEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Io("handle cache mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs the tenant schema initializer against a freshly opened handle.
fn initialize_tenant_handle(handle: &StoreHandle) -> Result<(), StoreError> {
    let mut guard = handle.connection()?;
    schema::initialize_tenant(&mut guard)
}

/// Removes every entry idle past the configured threshold.
fn evict_idle(entries: &mut HashMap<TenantKey, CacheEntry>, config: &StoreManagerConfig) {
    let threshold = config.idle_timeout();
    let now = Instant::now();
    let idle: Vec<TenantKey> = entries
        .iter()
        .filter(|(_, entry)| now.duration_since(entry.last_access) > threshold)
        .map(|(tenant, _)| tenant.clone())
        .collect();
    for tenant in idle {
        entries.remove(&tenant);
        tracing::debug!(tenant = %tenant, "evicted idle tenant store handle");
    }
}
