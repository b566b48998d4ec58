// crates/orgvault-core/src/core/mod.rs
// ============================================================================
// Module: Orgvault Core Types
// Description: Identifier newtypes and shared-directory account types.
// Purpose: Group the pure data types used across Orgvault crates.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Pure data types: validated tenant keys and the account records stored in
//! the shared cross-tenant directory.

/// Account records and role tags for the shared directory.
pub mod accounts;
/// Validated identifier newtypes.
pub mod identifiers;
