//! Audit log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditEntryId, UserId};

/// A persisted audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Row identifier assigned by the store.
    pub id: AuditEntryId,
    /// Who performed the action.
    pub actor_id: UserId,
    /// What was done.
    pub action: AuditAction,
    /// Table the action touched.
    pub entity: String,
    /// Row the action touched, when it targets a single row.
    pub entity_id: Option<String>,
    /// Free-form context.
    #[serde(default)]
    pub meta: serde_json::Value,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

/// An audit row about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Who performed the action.
    pub actor_id: UserId,
    /// What was done.
    pub action: AuditAction,
    /// Table the action touched.
    pub entity: String,
    /// Row the action touched, if any.
    pub entity_id: Option<String>,
    /// Free-form context.
    pub meta: serde_json::Value,
}

impl NewAuditEntry {
    /// Build an audit row for a batch action (no single target row).
    #[must_use]
    pub fn new(actor_id: UserId, action: AuditAction, meta: serde_json::Value) -> Self {
        Self {
            actor_id,
            action,
            entity: action.entity().to_string(),
            entity_id: None,
            meta,
        }
    }
}

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A user claimed leads.
    Claim,
    /// An administrator granted credit.
    CreditGrant,
    /// An administrator imported leads.
    ImportLeads,
    /// Any tag written by another producer.
    #[serde(other)]
    Other,
}

impl AuditAction {
    /// Table an action of this kind touches.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        match self {
            Self::Claim => "lead_access",
            Self::CreditGrant => "credit_ledger",
            Self::ImportLeads => "leads",
            Self::Other => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_derives_entity_from_action() {
        let actor = UserId::generate();
        let entry = NewAuditEntry::new(actor, AuditAction::ImportLeads, serde_json::json!({ "imported": 2 }));

        assert_eq!(entry.entity, "leads");
        assert!(entry.entity_id.is_none());
        assert_eq!(entry.meta["imported"], 2);
    }

    #[test]
    fn actions_serialize_as_snake_case() {
        assert_eq!(serde_json::to_string(&AuditAction::CreditGrant).unwrap(), "\"credit_grant\"");
        assert_eq!(serde_json::to_string(&AuditAction::Claim).unwrap(), "\"claim\"");
    }
}
