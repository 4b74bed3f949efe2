//! Entitlement rows.
//!
//! A [`LeadAccess`] row is the whole entitlement: its existence grants the
//! user full access to the lead. There is no flag and no expiry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::{LeadId, UserId};

/// One `(user, lead)` entitlement pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadAccess {
    /// The entitled user.
    pub user_id: UserId,
    /// The lead the user may see unmasked.
    pub lead_id: LeadId,
}

impl LeadAccess {
    /// Create an entitlement pair.
    #[must_use]
    pub const fn new(user_id: UserId, lead_id: LeadId) -> Self {
        Self { user_id, lead_id }
    }
}

/// How the claimed leads are going to be used. Recorded in ledger metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Single-lead download from the dashboard.
    #[default]
    Download,
    /// Bulk export.
    Export,
}

impl AccessType {
    /// Wire name of the access type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download" => Ok(Self::Download),
            "export" => Ok(Self::Export),
            other => Err(CoreError::InvalidAccessType(other.to_string())),
        }
    }
}
