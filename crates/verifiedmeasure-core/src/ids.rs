//! Identifier types for VerifiedMeasure.
//!
//! Every row in the external store is keyed by a UUID. The `uuid_id_type!`
//! macro wraps each one in a distinct newtype so a lead id can never be passed
//! where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the canonical textual UUID form accepted for lead ids.
pub const LEAD_ID_LEN: usize = 36;

/// Macro to define a UUID-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `uuid::Uuid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
///
/// # Example
///
/// ```ignore
/// uuid_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::generate();
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

uuid_id_type!(UserId, "A user identifier issued by the external auth provider.\n\nExtracted from the `sub` claim of a session token or from the provider's user lookup.");
uuid_id_type!(LeadId, "A lead identifier (primary key of the `leads` table).");
uuid_id_type!(LedgerEntryId, "A credit ledger row identifier.");
uuid_id_type!(AuditEntryId, "An audit log row identifier.");

impl LeadId {
    /// Parse a client-supplied lead id, accepting only the canonical shape.
    ///
    /// The input must be exactly 36 characters of hex digits and hyphens and
    /// must also parse as a UUID. Anything else yields `None` so callers can
    /// silently filter it out.
    #[must_use]
    pub fn parse_shaped(s: &str) -> Option<Self> {
        if !is_lead_id_shape(s) {
            return None;
        }
        s.parse().ok()
    }
}

/// Check the textual shape of a lead id: 36 hex digits or hyphens.
#[must_use]
pub fn is_lead_id_shape(s: &str) -> bool {
    s.len() == LEAD_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit() || b == b'-')
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::generate();
        let parsed = UserId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn lead_id_serializes_as_plain_string() {
        let id = LeadId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn lead_id_shape_accepts_canonical_uuid() {
        let id = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
        assert!(is_lead_id_shape(id));
        assert!(LeadId::parse_shaped(id).is_some());
        assert!(LeadId::parse_shaped(&id.to_uppercase()).is_some());
    }

    #[test]
    fn lead_id_shape_rejects_other_forms() {
        // Simple (unhyphenated) form is a valid UUID but not the accepted shape.
        assert!(LeadId::parse_shaped("3f2504e04f8911d39a0c0305e82c3301").is_none());
        assert!(LeadId::parse_shaped("not-a-lead").is_none());
        assert!(LeadId::parse_shaped("").is_none());
        assert!(LeadId::parse_shaped("zf2504e0-4f89-11d3-9a0c-0305e82c3301").is_none());
    }

    #[test]
    fn shape_only_match_is_still_filtered() {
        let dashes = "-".repeat(LEAD_ID_LEN);
        assert!(is_lead_id_shape(&dashes));
        assert!(LeadId::parse_shaped(&dashes).is_none());
    }

    #[test]
    fn invalid_user_id_is_rejected() {
        assert_eq!(UserId::from_str("nope"), Err(IdError::InvalidUuid));
    }
}
