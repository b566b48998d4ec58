// crates/orgvault-store-sqlite/src/manager.rs
// ============================================================================
// Module: Tenant Store Manager
// Description: Public facade over the shared store and the handle cache.
// Purpose: Resolve every data access to the correct tenant-isolated store.
// Dependencies: orgvault-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! The [`StoreManager`] is a constructed object with an explicit lifecycle:
//! [`StoreManager::open`] must complete before the process accepts traffic
//! (it opens and initializes the always-open shared store), and
//! [`StoreManager::shutdown`] closes every cached tenant handle. Request
//! handlers receive the manager by reference; there is no ambient global
//! state.
//!
//! A `tenant_store` failure with [`StoreError::NotProvisioned`] is the
//! client-visible "tenant not found/not ready" condition; callers must not
//! collapse it into a generic internal error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use orgvault_core::OrganizationRecord;
use orgvault_core::StoreError;
use orgvault_core::TenantDirectory;
use orgvault_core::TenantKey;

use crate::cache::HandleCache;
use crate::config::StoreManagerConfig;
use crate::directory;
use crate::directory::MemberAccounts;
use crate::directory::OperatorAccounts;
use crate::handle::StoreHandle;
use crate::schema;

// ============================================================================
// SECTION: Store Manager
// ============================================================================

/// Entry point for all tenant and shared store access.
///
/// # Invariants
/// - The shared store handle lives for the manager's lifetime and is never
///   evicted.
/// - Tenant handles are owned exclusively by the embedded cache.
#[derive(Debug)]
pub struct StoreManager {
    /// Always-open handle to the shared cross-tenant store.
    shared: Arc<StoreHandle>,
    /// Bounded cache of open tenant handles.
    cache: HandleCache,
}

impl StoreManager {
    /// Opens the shared store and prepares the tenant cache.
    ///
    /// Must complete before the system accepts traffic; a failure here is
    /// fatal to process startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the config is invalid, the data
    /// directory cannot be created, or the shared store cannot be opened
    /// and initialized.
    pub fn open(config: StoreManagerConfig) -> Result<Self, StoreError> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let shared =
            StoreHandle::open(&config, config.shared_store_path(), None, true)?;
        {
            let mut guard = shared.connection()?;
            schema::initialize_shared(&mut guard)?;
        }
        tracing::info!(data_dir = %config.data_dir.display(), "shared store opened");
        Ok(Self {
            shared: Arc::new(shared),
            cache: HandleCache::new(config),
        })
    }

    /// Returns the always-open shared store handle.
    #[must_use]
    pub fn main_store(&self) -> Arc<StoreHandle> {
        Arc::clone(&self.shared)
    }

    /// Resolves a tenant's store handle, opening it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotProvisioned`] when the tenant has no store
    /// file yet, and other [`StoreError`] variants on open or schema
    /// failures.
    pub fn tenant_store(&self, tenant: &TenantKey) -> Result<Arc<StoreHandle>, StoreError> {
        self.cache.get(tenant)
    }

    /// Provisions a new tenant store and registers the organization.
    ///
    /// Whether the tenant is allowed to exist is the caller's
    /// business-layer decision; this method creates the store file,
    /// initializes its schema, and records the organization in the shared
    /// registry when no row exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when provisioning or the registry insert
    /// fails.
    pub fn create_tenant_store(
        &self,
        tenant: &TenantKey,
    ) -> Result<Arc<StoreHandle>, StoreError> {
        let handle = self.cache.provision(tenant)?;
        directory::register_organization(
            &self.shared,
            &OrganizationRecord {
                tenant_key: tenant.clone(),
                display_name: tenant.as_str().to_string(),
                created_at_ms: unix_millis(),
                active: true,
            },
        )?;
        tracing::info!(tenant = %tenant, "tenant store provisioned");
        Ok(handle)
    }

    /// Looks up the organization row for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the registry cannot be read.
    pub fn organization(
        &self,
        tenant: &TenantKey,
    ) -> Result<Option<OrganizationRecord>, StoreError> {
        directory::find_organization(&self.shared, tenant)
    }

    /// Closes one cached tenant handle; no-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the cache is unavailable.
    pub fn disconnect_tenant(&self, tenant: &TenantKey) -> Result<bool, StoreError> {
        self.cache.disconnect(tenant)
    }

    /// Closes every cached tenant handle; called at process shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the cache is unavailable.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        self.cache.disconnect_all()
    }

    /// Returns the number of currently open tenant handles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the cache is unavailable.
    pub fn open_tenant_handles(&self) -> Result<usize, StoreError> {
        self.cache.len()
    }

    /// Returns the operator accounts repository over the shared store.
    #[must_use]
    pub fn operator_accounts(&self) -> OperatorAccounts {
        OperatorAccounts::new(Arc::clone(&self.shared))
    }

    /// Returns the member accounts repository over the shared store.
    #[must_use]
    pub fn member_accounts(&self) -> MemberAccounts {
        MemberAccounts::new(Arc::clone(&self.shared))
    }
}

impl TenantDirectory for StoreManager {
    fn active_tenants(&self) -> Result<Vec<TenantKey>, StoreError> {
        directory::active_tenant_keys(&self.shared)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current wall-clock time in unix milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
