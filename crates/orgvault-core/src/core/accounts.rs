// crates/orgvault-core/src/core/accounts.rs
// ============================================================================
// Module: Orgvault Directory Accounts
// Description: Account records and role tags for the shared directory.
// Purpose: Type the two structurally similar account tables in the shared
//          store instead of selecting a table name at runtime.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The shared store holds two account tables with the same shape: operator
//! accounts (back-office staff) and member accounts (organization-facing
//! logins). Earlier revisions chose between the tables with a runtime string
//! flag; here the choice is a typed [`AccountRole`], and each role maps to
//! its own repository implementation behind the `AccountRecords` capability
//! trait. Identifiers are never interpolated into SQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Account Types
// ============================================================================

/// Role tag selecting one of the shared-directory account tables.
///
/// # Invariants
/// - Variants map 1:1 to fixed tables created by the shared schema
///   initializer; no other tables are reachable through a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Back-office operator account (may carry the privileged capability).
    Operator,
    /// Organization member account.
    Member,
}

impl AccountRole {
    /// Returns a stable label for audit logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Member => "member",
        }
    }
}

/// One account row in the shared directory.
///
/// # Invariants
/// - `login` is unique within its role's table.
/// - `password_hash` is an opaque verifier; this crate never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Unique login within the role's table.
    pub login: String,
    /// Display name shown in administrative listings.
    pub display_name: String,
    /// Opaque password verifier produced by the auth layer.
    pub password_hash: String,
    /// Creation timestamp in unix milliseconds.
    pub created_at_ms: i64,
}
