// crates/orgvault-store-sqlite/src/directory.rs
// ============================================================================
// Module: Shared Directory
// Description: Organization registry and role-typed account repositories
//              over the shared store.
// Purpose: Give the manager and backup pipeline typed access to the
//          cross-tenant registry without runtime table selection.
// Dependencies: orgvault-core, rusqlite
// ============================================================================

//! ## Overview
//! All cross-tenant rows live in the shared store: the `organizations`
//! registry plus the two account tables. The account tables share a shape
//! but are distinct types here: [`OperatorAccounts`] and [`MemberAccounts`]
//! each carry their table name as a compile-time constant and implement the
//! [`AccountRecords`] capability trait. No identifier is ever interpolated
//! from runtime input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use orgvault_core::AccountRecord;
use orgvault_core::AccountRecords;
use orgvault_core::AccountRole;
use orgvault_core::OrganizationRecord;
use orgvault_core::StoreError;
use orgvault_core::TenantKey;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::handle::StoreHandle;

// ============================================================================
// SECTION: Organization Registry
// ============================================================================

/// Registers an organization row when it is not already present.
///
/// # Errors
///
/// Returns [`StoreError`] when the insert fails.
pub(crate) fn register_organization(
    shared: &StoreHandle,
    record: &OrganizationRecord,
) -> Result<(), StoreError> {
    let guard = shared.connection()?;
    guard
        .execute(
            "INSERT INTO organizations (tenant_key, display_name, created_at_ms, active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(tenant_key) DO NOTHING",
            params![
                record.tenant_key.as_str(),
                record.display_name.as_str(),
                record.created_at_ms,
                i64::from(record.active)
            ],
        )
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(())
}

/// Lists the keys of all active organizations, ordered by key.
///
/// # Errors
///
/// Returns [`StoreError`] when the query fails or a stored key no longer
/// passes validation.
pub(crate) fn active_tenant_keys(shared: &StoreHandle) -> Result<Vec<TenantKey>, StoreError> {
    let guard = shared.connection()?;
    let mut stmt = guard
        .prepare("SELECT tenant_key FROM organizations WHERE active = 1 ORDER BY tenant_key")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    let mut keys = Vec::new();
    for row in rows {
        let raw = row.map_err(|err| StoreError::Db(err.to_string()))?;
        let key = TenantKey::new(raw)
            .map_err(|err| StoreError::Invalid(format!("stored tenant key invalid: {err}")))?;
        keys.push(key);
    }
    Ok(keys)
}

/// Looks up one organization row by tenant key.
///
/// # Errors
///
/// Returns [`StoreError`] when the query fails.
pub(crate) fn find_organization(
    shared: &StoreHandle,
    tenant: &TenantKey,
) -> Result<Option<OrganizationRecord>, StoreError> {
    let guard = shared.connection()?;
    let row = guard
        .query_row(
            "SELECT display_name, created_at_ms, active FROM organizations WHERE tenant_key = ?1",
            params![tenant.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(row.map(|(display_name, created_at_ms, active)| OrganizationRecord {
        tenant_key: tenant.clone(),
        display_name,
        created_at_ms,
        active: active != 0,
    }))
}

// ============================================================================
// SECTION: Account Repositories
// ============================================================================

/// Operator accounts repository bound to the `operator_accounts` table.
#[derive(Debug, Clone)]
pub struct OperatorAccounts {
    /// Shared store handle.
    shared: Arc<StoreHandle>,
}

/// Member accounts repository bound to the `member_accounts` table.
#[derive(Debug, Clone)]
pub struct MemberAccounts {
    /// Shared store handle.
    shared: Arc<StoreHandle>,
}

impl OperatorAccounts {
    /// Creates a repository over the shared store.
    #[must_use]
    pub const fn new(shared: Arc<StoreHandle>) -> Self {
        Self {
            shared,
        }
    }
}

impl MemberAccounts {
    /// Creates a repository over the shared store.
    #[must_use]
    pub const fn new(shared: Arc<StoreHandle>) -> Self {
        Self {
            shared,
        }
    }
}

impl AccountRecords for OperatorAccounts {
    fn role(&self) -> AccountRole {
        AccountRole::Operator
    }

    fn insert(&self, record: &AccountRecord) -> Result<(), StoreError> {
        insert_account(
            &self.shared,
            "INSERT INTO operator_accounts (login, display_name, password_hash, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            record,
        )
    }

    fn find(&self, login: &str) -> Result<Option<AccountRecord>, StoreError> {
        find_account(
            &self.shared,
            "SELECT login, display_name, password_hash, created_at_ms
             FROM operator_accounts WHERE login = ?1",
            login,
        )
    }

    fn list(&self) -> Result<Vec<AccountRecord>, StoreError> {
        list_accounts(
            &self.shared,
            "SELECT login, display_name, password_hash, created_at_ms
             FROM operator_accounts ORDER BY login",
        )
    }
}

impl AccountRecords for MemberAccounts {
    fn role(&self) -> AccountRole {
        AccountRole::Member
    }

    fn insert(&self, record: &AccountRecord) -> Result<(), StoreError> {
        insert_account(
            &self.shared,
            "INSERT INTO member_accounts (login, display_name, password_hash, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            record,
        )
    }

    fn find(&self, login: &str) -> Result<Option<AccountRecord>, StoreError> {
        find_account(
            &self.shared,
            "SELECT login, display_name, password_hash, created_at_ms
             FROM member_accounts WHERE login = ?1",
            login,
        )
    }

    fn list(&self) -> Result<Vec<AccountRecord>, StoreError> {
        list_accounts(
            &self.shared,
            "SELECT login, display_name, password_hash, created_at_ms
             FROM member_accounts ORDER BY login",
        )
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Executes a fixed account insert statement.
fn insert_account(
    shared: &StoreHandle,
    sql: &str,
    record: &AccountRecord,
) -> Result<(), StoreError> {
    let guard = shared.connection()?;
    guard
        .execute(
            sql,
            params![
                record.login.as_str(),
                record.display_name.as_str(),
                record.password_hash.as_str(),
                record.created_at_ms
            ],
        )
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(())
}

/// Executes a fixed single-account query.
fn find_account(
    shared: &StoreHandle,
    sql: &str,
    login: &str,
) -> Result<Option<AccountRecord>, StoreError> {
    let guard = shared.connection()?;
    guard
        .query_row(sql, params![login], map_account_row)
        .optional()
        .map_err(|err| StoreError::Db(err.to_string()))
}

/// Executes a fixed account listing query.
fn list_accounts(shared: &StoreHandle, sql: &str) -> Result<Vec<AccountRecord>, StoreError> {
    let guard = shared.connection()?;
    let mut stmt = guard.prepare(sql).map_err(|err| StoreError::Db(err.to_string()))?;
    let rows = stmt.query_map([], map_account_row).map_err(|err| StoreError::Db(err.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|err| StoreError::Db(err.to_string()))
}

/// Maps one account row.
fn map_account_row(row: &rusqlite::Row<'_>) -> Result<AccountRecord, rusqlite::Error> {
    Ok(AccountRecord {
        login: row.get(0)?,
        display_name: row.get(1)?,
        password_hash: row.get(2)?,
        created_at_ms: row.get(3)?,
    })
}
