// crates/orgvault-core/src/interfaces/mod.rs
// ============================================================================
// Module: Orgvault Interfaces
// Description: Backend-agnostic interfaces for tenant storage and directory.
// Purpose: Define the contract surfaces between controllers, the store
//          manager, and the backup pipeline.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces between the request layer and the storage core. Controllers
//! depend on these traits, never on the SQLite crate directly; the backup
//! orchestrator consumes [`TenantDirectory`] to enumerate tenants without
//! knowing how the registry is stored.
//!
//! Security posture: the [`Capability`] value is produced by the auth layer
//! from a verified token; this crate only reads the privileged flag and
//! fails closed when it is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::accounts::AccountRecord;
use crate::core::accounts::AccountRole;
use crate::core::identifiers::TenantKey;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tenant store errors.
///
/// # Invariants
/// - `NotProvisioned` is the only variant mapped to a client-visible
///   "tenant not found/not ready" condition; all others are server errors.
/// - Messages avoid embedding row payloads.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Tenant store file does not exist on disk.
    #[error("tenant store not provisioned: {0}")]
    NotProvisioned(TenantKey),
    /// Store I/O error.
    #[error("tenant store io error: {0}")]
    Io(String),
    /// Embedded engine error.
    #[error("tenant store db error: {0}")]
    Db(String),
    /// Schema initialization or version error.
    #[error("tenant store schema error: {0}")]
    Schema(String),
    /// Invalid store data or configuration.
    #[error("tenant store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Capability
// ============================================================================

/// Caller capability supplied by the auth layer.
///
/// # Invariants
/// - Constructed only from a verified auth context; the core never derives
///   it from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Whether the caller is a privileged operator.
    privileged_operator: bool,
}

impl Capability {
    /// Returns the capability of a privileged operator.
    #[must_use]
    pub const fn operator() -> Self {
        Self {
            privileged_operator: true,
        }
    }

    /// Returns the capability of an unprivileged caller.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            privileged_operator: false,
        }
    }

    /// Returns true when the caller may run, list, or delete backups.
    #[must_use]
    pub const fn is_privileged_operator(self) -> bool {
        self.privileged_operator
    }
}

// ============================================================================
// SECTION: Tenant Directory
// ============================================================================

/// One organization row in the shared registry.
///
/// # Invariants
/// - `tenant_key` identifies the tenant's store file; inactive
///   organizations keep their row for audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Tenant key (subdomain).
    pub tenant_key: TenantKey,
    /// Human-readable organization name.
    pub display_name: String,
    /// Creation timestamp in unix milliseconds.
    pub created_at_ms: i64,
    /// Whether the organization is active (enumerated by backups).
    pub active: bool,
}

/// Read access to the cross-tenant registry in the shared store.
pub trait TenantDirectory {
    /// Lists the keys of all active tenants, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the registry cannot be read.
    fn active_tenants(&self) -> Result<Vec<TenantKey>, StoreError>;
}

// ============================================================================
// SECTION: Account Records
// ============================================================================

/// Capability interface shared by the role-typed account repositories.
///
/// Implementations are bound to exactly one [`AccountRole`] table; the role
/// is part of the type, never a query parameter.
pub trait AccountRecords {
    /// Returns the role this repository is bound to.
    fn role(&self) -> AccountRole;

    /// Inserts an account row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on duplicate login or engine failure.
    fn insert(&self, record: &AccountRecord) -> Result<(), StoreError>;

    /// Looks up one account by login.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find(&self, login: &str) -> Result<Option<AccountRecord>, StoreError>;

    /// Lists all accounts in the repository's table, ordered by login.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list(&self) -> Result<Vec<AccountRecord>, StoreError>;
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Capability;

    #[test]
    fn capability_flags_are_stable() {
        assert!(Capability::operator().is_privileged_operator());
        assert!(!Capability::standard().is_privileged_operator());
    }
}
