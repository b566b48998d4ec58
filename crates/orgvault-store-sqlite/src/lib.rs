// crates/orgvault-store-sqlite/src/lib.rs
// ============================================================================
// Module: Orgvault SQLite Store
// Description: Tenant-isolated SQLite stores behind a bounded handle cache.
// Purpose: Route every data access to the correct tenant store and own the
//          lifecycle of all open store handles.
// Dependencies: orgvault-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate implements the Orgvault storage core: one always-open shared
//! store holding the cross-tenant registry, plus one embedded SQLite store
//! per tenant, opened lazily and kept in a bounded, idle-evicting handle
//! cache. The [`StoreManager`] is the only public entry point; controllers
//! resolve handles through it and never open store files themselves.
//!
//! Security posture: tenant keys are validated at construction in
//! `orgvault-core`, so store paths derived from them are path-safe. Store
//! contents are untrusted.

/// Bounded tenant handle cache with lazy idle eviction.
pub mod cache;
/// Store manager configuration model.
pub mod config;
/// Role-typed account repositories over the shared store.
pub mod directory;
/// Open store handles and consistent snapshots.
pub mod handle;
/// Tenant store manager facade.
pub mod manager;
/// Versioned, idempotent schema initializers.
pub mod schema;

pub use cache::HandleCache;
pub use config::CacheSettings;
pub use config::SqliteJournalMode;
pub use config::SqliteSyncMode;
pub use config::StoreManagerConfig;
pub use directory::MemberAccounts;
pub use directory::OperatorAccounts;
pub use handle::StoreHandle;
pub use manager::StoreManager;
