// crates/orgvault-store-sqlite/tests/store_manager_unit.rs
// ============================================================================
// Module: Store Manager Unit Tests
// Description: Targeted tests for tenant provisioning, handle caching, and
//              snapshots.
// Purpose: Validate provisioning semantics, cache bound/eviction, the
//          single-handle invariant, and consistent snapshot copies.
// ============================================================================

//! ## Overview
//! Unit-level tests for the storage core invariants:
//! - `NotProvisioned` before provisioning; full schema after
//! - Cache bound enforcement with lazy idle eviction
//! - Exactly one open handle under concurrent first access
//! - Role-typed account repositories over the shared store
//! - Online snapshot copies that open as standalone stores

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use orgvault_core::AccountRecord;
use orgvault_core::AccountRecords;
use orgvault_core::AccountRole;
use orgvault_core::StoreError;
use orgvault_core::TenantDirectory;
use orgvault_core::TenantKey;
use orgvault_store_sqlite::StoreManager;
use orgvault_store_sqlite::StoreManagerConfig;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn key(raw: &str) -> TenantKey {
    TenantKey::new(raw).expect("valid tenant key")
}

fn manager_in(dir: &TempDir) -> StoreManager {
    StoreManager::open(StoreManagerConfig::rooted_at(dir.path())).expect("manager opens")
}

fn manager_with_cache(dir: &TempDir, max_open: usize, idle_timeout_ms: u64) -> StoreManager {
    let mut config = StoreManagerConfig::rooted_at(dir.path());
    config.cache.max_open = max_open;
    config.cache.idle_timeout_ms = idle_timeout_ms;
    StoreManager::open(config).expect("manager opens")
}

fn tenant_table_names(manager: &StoreManager, tenant: &TenantKey) -> Vec<String> {
    let handle = manager.tenant_store(tenant).expect("tenant store resolves");
    let guard = handle.connection().expect("connection");
    let mut stmt = guard
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .expect("prepare");
    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).expect("query");
    rows.collect::<Result<Vec<_>, _>>().expect("rows")
}

// ============================================================================
// SECTION: Provisioning
// ============================================================================

#[test]
fn resolve_before_provisioning_reports_not_provisioned() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let result = manager.tenant_store(&key("north"));
    assert!(matches!(result, Err(StoreError::NotProvisioned(ref tenant)) if tenant.as_str() == "north"));
}

#[test]
fn provisioned_tenant_resolves_with_full_schema() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let north = key("north");
    manager.create_tenant_store(&north).expect("provision");
    let tables = tenant_table_names(&manager, &north);
    for expected in ["members", "liveness_checks", "reenrollments", "events"] {
        assert!(tables.iter().any(|name| name == expected), "missing table {expected}");
    }
}

#[test]
fn provisioning_registers_the_organization() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    manager.create_tenant_store(&key("south")).expect("provision");
    manager.create_tenant_store(&key("north")).expect("provision");
    let active = manager.active_tenants().expect("active tenants");
    let keys: Vec<&str> = active.iter().map(TenantKey::as_str).collect();
    assert_eq!(keys, vec!["north", "south"]);
    let record = manager.organization(&key("north")).expect("lookup").expect("row");
    assert!(record.active);
    assert_eq!(record.display_name, "north");
}

#[test]
fn provisioning_does_not_populate_the_cache() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    manager.create_tenant_store(&key("north")).expect("provision");
    assert_eq!(manager.open_tenant_handles().expect("count"), 0);
    manager.tenant_store(&key("north")).expect("resolve");
    assert_eq!(manager.open_tenant_handles().expect("count"), 1);
}

// ============================================================================
// SECTION: Cache Bound & Eviction
// ============================================================================

#[test]
fn at_capacity_insert_evicts_idle_entries() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_with_cache(&dir, 2, 1);
    for raw in ["alpha", "beta", "gamma"] {
        manager.create_tenant_store(&key(raw)).expect("provision");
    }
    manager.tenant_store(&key("alpha")).expect("resolve");
    manager.tenant_store(&key("beta")).expect("resolve");
    assert_eq!(manager.open_tenant_handles().expect("count"), 2);
    // Both entries pass the 1ms idle threshold before the third access.
    thread::sleep(Duration::from_millis(20));
    manager.tenant_store(&key("gamma")).expect("resolve");
    assert_eq!(manager.open_tenant_handles().expect("count"), 1);
}

#[test]
fn recently_used_entries_survive_eviction() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_with_cache(&dir, 2, 60_000);
    for raw in ["alpha", "beta", "gamma"] {
        manager.create_tenant_store(&key(raw)).expect("provision");
    }
    manager.tenant_store(&key("alpha")).expect("resolve");
    manager.tenant_store(&key("beta")).expect("resolve");
    // Nothing is idle past one minute, so the bound is exceeded by design.
    manager.tenant_store(&key("gamma")).expect("resolve");
    assert_eq!(manager.open_tenant_handles().expect("count"), 3);
}

#[test]
fn disconnect_all_closes_every_entry() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    for raw in ["alpha", "beta"] {
        manager.create_tenant_store(&key(raw)).expect("provision");
        manager.tenant_store(&key(raw)).expect("resolve");
    }
    assert_eq!(manager.open_tenant_handles().expect("count"), 2);
    manager.shutdown().expect("shutdown");
    assert_eq!(manager.open_tenant_handles().expect("count"), 0);
}

#[test]
fn disconnect_single_tenant_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let north = key("north");
    manager.create_tenant_store(&north).expect("provision");
    manager.tenant_store(&north).expect("resolve");
    assert!(manager.disconnect_tenant(&north).expect("disconnect"));
    assert!(!manager.disconnect_tenant(&north).expect("disconnect again"));
}

// ============================================================================
// SECTION: Single-Handle Invariant
// ============================================================================

#[test]
fn concurrent_first_access_opens_exactly_one_handle() {
    let dir = TempDir::new().expect("tempdir");
    let manager = Arc::new(manager_in(&dir));
    let north = key("north");
    manager.create_tenant_store(&north).expect("provision");
    let mut workers = Vec::new();
    for _ in 0 .. 8 {
        let manager = Arc::clone(&manager);
        let north = north.clone();
        workers.push(thread::spawn(move || {
            manager.tenant_store(&north).expect("resolve")
        }));
    }
    let handles: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker joins"))
        .collect();
    assert_eq!(manager.open_tenant_handles().expect("count"), 1);
    let first = &handles[0];
    for handle in &handles {
        assert!(Arc::ptr_eq(first, handle), "callers received different handles");
    }
}

// ============================================================================
// SECTION: Shared Directory
// ============================================================================

#[test]
fn role_typed_repositories_write_distinct_tables() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let operators = manager.operator_accounts();
    let members = manager.member_accounts();
    assert_eq!(operators.role(), AccountRole::Operator);
    assert_eq!(members.role(), AccountRole::Member);
    let record = AccountRecord {
        login: "ana".to_string(),
        display_name: "Ana".to_string(),
        password_hash: "argon2id$stub".to_string(),
        created_at_ms: 1_700_000_000_000,
    };
    operators.insert(&record).expect("insert operator");
    assert!(operators.find("ana").expect("find").is_some());
    assert!(members.find("ana").expect("find").is_none());
    members.insert(&record).expect("insert member");
    assert_eq!(operators.list().expect("list").len(), 1);
    assert_eq!(members.list().expect("list").len(), 1);
}

#[test]
fn duplicate_operator_login_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let operators = manager.operator_accounts();
    let record = AccountRecord {
        login: "ana".to_string(),
        display_name: "Ana".to_string(),
        password_hash: "argon2id$stub".to_string(),
        created_at_ms: 1_700_000_000_000,
    };
    operators.insert(&record).expect("insert operator");
    assert!(matches!(operators.insert(&record), Err(StoreError::Db(_))));
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

#[test]
fn snapshot_copy_opens_as_standalone_store() {
    let dir = TempDir::new().expect("tempdir");
    let manager = manager_in(&dir);
    let north = key("north");
    manager.create_tenant_store(&north).expect("provision");
    let handle = manager.tenant_store(&north).expect("resolve");
    {
        let guard = handle.connection().expect("connection");
        guard
            .execute(
                "INSERT INTO members (document, full_name, enrolled_at_ms)
                 VALUES ('123', 'Maria Silva', 1700000000000)",
                [],
            )
            .expect("insert member");
    }
    let dest = dir.path().join("north-snapshot.db");
    handle.snapshot_to(&dest).expect("snapshot");
    let copy = Connection::open(&dest).expect("open snapshot");
    let count: i64 = copy
        .query_row("SELECT COUNT(1) FROM members", [], |row| row.get(0))
        .expect("count members");
    assert_eq!(count, 1);
}
