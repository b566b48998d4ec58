// crates/orgvault-core/src/core/identifiers.rs
// ============================================================================
// Module: Orgvault Identifiers
// Description: Validated identifier newtypes for tenants.
// Purpose: Make tenant keys safe to use as cache keys and on-disk names.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`TenantKey`] is the opaque, stable identifier of one tenant (the
//! subdomain in the hosted deployment). It is used verbatim as the cache key
//! and as the stem of the tenant's store file name, so construction enforces
//! a filesystem-safe charset. Keys that fail validation never exist as
//! values; downstream code may treat any `TenantKey` as path-safe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a tenant key in bytes.
const MAX_TENANT_KEY_LENGTH: usize = 63;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tenant key validation errors.
///
/// # Invariants
/// - Messages never echo the rejected raw value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTenantKey {
    /// Key was empty.
    #[error("tenant key must not be empty")]
    Empty,
    /// Key exceeded the length limit.
    #[error("tenant key exceeds {MAX_TENANT_KEY_LENGTH} bytes")]
    TooLong,
    /// Key contained a character outside `[a-z0-9-]`.
    #[error("tenant key contains invalid character")]
    InvalidCharacter,
    /// Key started or ended with a hyphen.
    #[error("tenant key must not start or end with a hyphen")]
    EdgeHyphen,
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Opaque tenant identifier (the organization's subdomain).
///
/// # Invariants
/// - 1..=63 bytes of lowercase ASCII alphanumerics and hyphens.
/// - Never starts or ends with a hyphen.
/// - Stable for the tenant's lifetime; used as cache key and store file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantKey(String);

impl TenantKey {
    /// Creates a tenant key after validating the raw value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTenantKey`] when the raw value is empty, too long,
    /// contains characters outside `[a-z0-9-]`, or has a leading/trailing
    /// hyphen.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidTenantKey> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidTenantKey::Empty);
        }
        if raw.len() > MAX_TENANT_KEY_LENGTH {
            return Err(InvalidTenantKey::TooLong);
        }
        let valid_charset = raw
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
        if !valid_charset {
            return Err(InvalidTenantKey::InvalidCharacter);
        }
        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(InvalidTenantKey::EdgeHyphen);
        }
        Ok(Self(raw))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantKey {
    type Error = InvalidTenantKey;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<TenantKey> for String {
    fn from(key: TenantKey) -> Self {
        key.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::InvalidTenantKey;
    use super::TenantKey;

    #[test]
    fn accepts_plain_subdomain_keys() {
        for raw in ["north", "south-branch", "org42"] {
            assert!(TenantKey::new(raw).is_ok(), "rejected {raw}");
        }
    }

    #[test]
    fn rejects_path_hostile_keys() {
        assert_eq!(TenantKey::new(""), Err(InvalidTenantKey::Empty));
        assert_eq!(TenantKey::new("../etc"), Err(InvalidTenantKey::InvalidCharacter));
        assert_eq!(TenantKey::new("a/b"), Err(InvalidTenantKey::InvalidCharacter));
        assert_eq!(TenantKey::new("UPPER"), Err(InvalidTenantKey::InvalidCharacter));
        assert_eq!(TenantKey::new("-edge"), Err(InvalidTenantKey::EdgeHyphen));
        assert_eq!(TenantKey::new("edge-"), Err(InvalidTenantKey::EdgeHyphen));
        assert_eq!(TenantKey::new("a".repeat(64)), Err(InvalidTenantKey::TooLong));
    }

    #[test]
    fn serde_round_trip_enforces_validation() {
        let key = serde_json::from_str::<TenantKey>("\"north\"");
        assert!(matches!(key, Ok(ref parsed) if parsed.as_str() == "north"));
        let rejected = serde_json::from_str::<TenantKey>("\"../etc\"");
        assert!(rejected.is_err());
    }
}
