// crates/orgvault-store-sqlite/src/schema.rs
// ============================================================================
// Module: Schema Initializer
// Description: Versioned, idempotent schema setup for shared and tenant
//              stores.
// Purpose: Guarantee the fixed table set exists before a handle is returned.
// Dependencies: orgvault-core, rusqlite
// ============================================================================

//! ## Overview
//! Two fixed schemas: the shared store carries the cross-tenant registry and
//! the role-typed account tables; each tenant store carries the business
//! table set. Both initializers are safe to run on every handle acquisition:
//! every structural statement is `CREATE ... IF NOT EXISTS`, each structure
//! is self-contained, and the recorded `store_meta` version fails closed
//! when a store written by a newer release is opened.
//!
//! The one-off data-fix scripts shipped alongside the deployment rely on
//! exactly this contract: tables exist after first acquisition and the
//! version row identifies the structure they are patching.

// ============================================================================
// SECTION: Imports
// ============================================================================

use orgvault_core::StoreError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version of the shared cross-tenant store.
pub const SHARED_SCHEMA_VERSION: i64 = 1;
/// Schema version of a tenant store.
pub const TENANT_SCHEMA_VERSION: i64 = 1;

/// Fixed table set of the shared store.
const SHARED_SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS organizations (
        tenant_key TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS operator_accounts (
        login TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS member_accounts (
        login TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at_ms INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_organizations_active
        ON organizations (active, tenant_key);";

/// Fixed table set of a tenant store.
const TENANT_SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY,
        document TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        birth_date TEXT,
        enrolled_at_ms INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS liveness_checks (
        id INTEGER PRIMARY KEY,
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        due_month TEXT NOT NULL,
        confirmed_at_ms INTEGER,
        confirmed_by TEXT
    );
    CREATE TABLE IF NOT EXISTS reenrollments (
        id INTEGER PRIMARY KEY,
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        campaign TEXT NOT NULL,
        submitted_at_ms INTEGER,
        status TEXT NOT NULL DEFAULT 'pending'
    );
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        published_at_ms INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_liveness_checks_member
        ON liveness_checks (member_id, due_month);
    CREATE INDEX IF NOT EXISTS idx_reenrollments_member
        ON reenrollments (member_id, campaign);";

// ============================================================================
// SECTION: Initializers
// ============================================================================

/// Initializes the shared store schema, upgrading older versions in place.
///
/// # Errors
///
/// Returns [`StoreError::Schema`] when the existing version is newer than
/// this release understands, and [`StoreError::Db`] on engine failures.
pub fn initialize_shared(connection: &mut Connection) -> Result<(), StoreError> {
    initialize(connection, SHARED_SCHEMA_VERSION, SHARED_SCHEMA_SQL)
}

/// Initializes a tenant store schema, upgrading older versions in place.
///
/// # Errors
///
/// Returns [`StoreError::Schema`] when the existing version is newer than
/// this release understands, and [`StoreError::Db`] on engine failures.
pub fn initialize_tenant(connection: &mut Connection) -> Result<(), StoreError> {
    initialize(connection, TENANT_SCHEMA_VERSION, TENANT_SCHEMA_SQL)
}

/// Runs one versioned structure batch inside a transaction.
fn initialize(
    connection: &mut Connection,
    target_version: i64,
    structure_sql: &str,
) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| StoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![target_version])
                .map_err(|err| StoreError::Db(err.to_string()))?;
            tx.execute_batch(structure_sql).map_err(|err| StoreError::Db(err.to_string()))?;
        }
        Some(found) if found == target_version => {
            // Re-acquisition of an initialized store: the IF NOT EXISTS batch
            // is still applied so a partially created structure self-heals.
            tx.execute_batch(structure_sql).map_err(|err| StoreError::Db(err.to_string()))?;
        }
        Some(found) if found < target_version => {
            // No structural migrations exist yet between recorded versions;
            // re-running the batch plus bumping the version is the upgrade.
            tx.execute_batch(structure_sql).map_err(|err| StoreError::Db(err.to_string()))?;
            tx.execute("UPDATE store_meta SET version = ?1", params![target_version])
                .map_err(|err| StoreError::Db(err.to_string()))?;
        }
        Some(found) => {
            return Err(StoreError::Schema(format!(
                "store schema version {found} is newer than supported {target_version}"
            )));
        }
    }
    tx.commit().map_err(|err| StoreError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize_shared;
    use super::initialize_tenant;

    type TestResult = Result<(), String>;

    fn table_names(connection: &Connection) -> Result<Vec<String>, String> {
        let mut stmt = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(|err| err.to_string())?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| err.to_string())?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| err.to_string())
    }

    #[test]
    fn shared_initializer_is_idempotent() -> TestResult {
        let mut connection = Connection::open_in_memory().map_err(|err| err.to_string())?;
        initialize_shared(&mut connection).map_err(|err| err.to_string())?;
        initialize_shared(&mut connection).map_err(|err| err.to_string())?;
        let tables = table_names(&connection)?;
        for expected in ["organizations", "operator_accounts", "member_accounts", "store_meta"] {
            if !tables.iter().any(|name| name == expected) {
                return Err(format!("missing table {expected}"));
            }
        }
        Ok(())
    }

    #[test]
    fn tenant_initializer_creates_full_business_table_set() -> TestResult {
        let mut connection = Connection::open_in_memory().map_err(|err| err.to_string())?;
        initialize_tenant(&mut connection).map_err(|err| err.to_string())?;
        initialize_tenant(&mut connection).map_err(|err| err.to_string())?;
        let tables = table_names(&connection)?;
        for expected in ["members", "liveness_checks", "reenrollments", "events", "store_meta"] {
            if !tables.iter().any(|name| name == expected) {
                return Err(format!("missing table {expected}"));
            }
        }
        Ok(())
    }

    #[test]
    fn newer_store_version_fails_closed() -> TestResult {
        let mut connection = Connection::open_in_memory().map_err(|err| err.to_string())?;
        initialize_tenant(&mut connection).map_err(|err| err.to_string())?;
        connection
            .execute("UPDATE store_meta SET version = 99", [])
            .map_err(|err| err.to_string())?;
        if initialize_tenant(&mut connection).is_ok() {
            return Err("newer store version was accepted".to_string());
        }
        Ok(())
    }
}
