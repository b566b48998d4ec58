// crates/orgvault-core/src/lib.rs
// ============================================================================
// Module: Orgvault Core
// Description: Identifiers, capability model, and storage-facing interfaces.
// Purpose: Define the backend-agnostic contract surfaces used by Orgvault.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types for the Orgvault multi-tenant store manager. Every tenant
//! ("organization") is addressed by a validated [`TenantKey`] and owns an
//! isolated relational store; the types here carry no storage backend
//! details. Implementations of the interface traits live in the
//! `orgvault-store-sqlite` crate.
//!
//! Security posture: tenant keys double as on-disk identifiers and are
//! validated at construction; callers must never build store paths from
//! unvalidated request input.

/// Identifier and account-role types.
pub mod core;
/// Storage and directory interfaces plus the shared error taxonomy.
pub mod interfaces;

pub use crate::core::accounts::AccountRecord;
pub use crate::core::accounts::AccountRole;
pub use crate::core::identifiers::InvalidTenantKey;
pub use crate::core::identifiers::TenantKey;
pub use crate::interfaces::AccountRecords;
pub use crate::interfaces::Capability;
pub use crate::interfaces::OrganizationRecord;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::TenantDirectory;
