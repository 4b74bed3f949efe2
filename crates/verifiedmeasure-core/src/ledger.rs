//! Credit ledger types.
//!
//! The ledger is append-only. A user's balance is never stored; it is the sum
//! of every delta recorded for that user (see [`balance_of`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccessType, LedgerEntryId, UserId};

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLedgerEntry {
    /// Row identifier assigned by the store.
    pub id: LedgerEntryId,

    /// The user whose balance this entry adjusts.
    pub user_id: UserId,

    /// Signed adjustment. Positive = credit, negative = debit.
    pub delta: i64,

    /// Why the entry was written.
    pub reason: LedgerReason,

    /// Free-form context (access type, granting admin, ...).
    #[serde(default)]
    pub meta: serde_json::Value,

    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// A ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    /// The user whose balance this entry adjusts.
    pub user_id: UserId,
    /// Signed adjustment.
    pub delta: i64,
    /// Why the entry is written.
    pub reason: LedgerReason,
    /// Free-form context.
    pub meta: serde_json::Value,
}

impl NewLedgerEntry {
    /// Debit for claiming `cost` net-new leads.
    #[must_use]
    pub fn claim(user_id: UserId, cost: i64, access_type: AccessType) -> Self {
        Self {
            user_id,
            delta: -cost.abs(), // Always negative for claims
            reason: LedgerReason::ClaimLeads,
            meta: serde_json::json!({ "access_type": access_type.as_str() }),
        }
    }

    /// Credit granted by an administrator.
    #[must_use]
    pub fn admin_grant(user_id: UserId, amount: i64, granted_by: UserId) -> Self {
        Self {
            user_id,
            delta: amount,
            reason: LedgerReason::AdminGrant,
            meta: serde_json::json!({ "granted_by": granted_by.to_string() }),
        }
    }
}

/// Reason tag stored with each ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    /// Debit for newly claimed leads.
    ClaimLeads,

    /// Credit granted by an administrator.
    AdminGrant,

    /// Any tag written by another producer (e.g. a database trigger).
    #[serde(other)]
    Other,
}

impl LedgerReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClaimLeads => "claim_leads",
            Self::AdminGrant => "admin_grant",
            Self::Other => "other",
        }
    }
}

/// Project a balance from ledger rows.
///
/// Only rows belonging to `user_id` are counted.
#[must_use]
pub fn balance_of<'a>(user_id: &UserId, entries: impl IntoIterator<Item = &'a CreditLedgerEntry>) -> i64 {
    entries
        .into_iter()
        .filter(|e| e.user_id == *user_id)
        .map(|e| e.delta)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user_id: UserId, delta: i64) -> CreditLedgerEntry {
        CreditLedgerEntry {
            id: LedgerEntryId::generate(),
            user_id,
            delta,
            reason: LedgerReason::Other,
            meta: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn claim_entry_is_negative() {
        let user = UserId::generate();
        let tx = NewLedgerEntry::claim(user, 3, AccessType::Export);

        assert_eq!(tx.delta, -3);
        assert_eq!(tx.reason, LedgerReason::ClaimLeads);
        assert_eq!(tx.meta["access_type"], "export");
    }

    #[test]
    fn admin_grant_records_granting_admin() {
        let user = UserId::generate();
        let admin = UserId::generate();
        let tx = NewLedgerEntry::admin_grant(user, 100, admin);

        assert_eq!(tx.delta, 100);
        assert_eq!(tx.reason, LedgerReason::AdminGrant);
        assert_eq!(tx.meta["granted_by"], admin.to_string());
    }

    #[test]
    fn balance_sums_only_the_users_rows() {
        let alice = UserId::generate();
        let bob = UserId::generate();
        let rows = vec![entry(alice, 100), entry(bob, 7), entry(alice, -30), entry(alice, 5)];

        assert_eq!(balance_of(&alice, &rows), 75);
        assert_eq!(balance_of(&bob, &rows), 7);
        assert_eq!(balance_of(&UserId::generate(), &rows), 0);
    }

    #[test]
    fn unknown_reason_tags_deserialize() {
        let reason: LedgerReason = serde_json::from_str("\"signup_bonus\"").unwrap();
        assert_eq!(reason, LedgerReason::Other);
        let reason: LedgerReason = serde_json::from_str("\"admin_grant\"").unwrap();
        assert_eq!(reason, LedgerReason::AdminGrant);
    }
}
