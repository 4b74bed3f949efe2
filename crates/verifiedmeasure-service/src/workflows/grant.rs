//! Administrative credit grants.

use serde_json::json;

use verifiedmeasure_core::{AuditAction, CoreError, NewAuditEntry, NewLedgerEntry, UserId};
use verifiedmeasure_store::{Session, Store};

use crate::config::AuditMode;
use crate::error::ApiError;
use crate::workflows::audit;

/// Largest amount whose floor is still an exact integer in an `f64`.
const MAX_EXACT_AMOUNT: f64 = 9_007_199_254_740_992.0;

/// Validate a requested grant amount and return the whole credits to add.
///
/// # Errors
///
/// Returns `CoreError::InvalidAmount` unless `amount` is finite, positive and
/// at least one whole credit.
#[allow(clippy::cast_possible_truncation)]
pub fn whole_credits(amount: f64) -> Result<i64, CoreError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::InvalidAmount);
    }
    let floored = amount.floor();
    if !(1.0..=MAX_EXACT_AMOUNT).contains(&floored) {
        return Err(CoreError::InvalidAmount);
    }
    Ok(floored as i64)
}

/// Grant credit to `target_user_id` on behalf of the admin in `session`.
///
/// The caller must already have passed the admin check. Returns the target's
/// balance after the grant.
///
/// # Errors
///
/// - `ApiError::Validation` for a blank or malformed user id, or a bad amount.
/// - `ApiError::Upstream` if any store call fails.
pub async fn grant_credit(
    store: &dyn Store,
    session: &Session,
    target_user_id: &str,
    amount: f64,
    audit_mode: AuditMode,
) -> Result<i64, ApiError> {
    let target = target_user_id.trim();
    if target.is_empty() {
        return Err(CoreError::Required("user_id").into());
    }
    let target: UserId = target
        .parse()
        .map_err(|_| ApiError::validation("invalid user_id"))?;
    let credits = whole_credits(amount)?;

    let balance_before = store.get_user_balance(session, &target).await?;
    store
        .insert_ledger_entry(
            session,
            &NewLedgerEntry::admin_grant(target, credits, session.user_id),
        )
        .await?;
    let new_balance = store.get_user_balance(session, &target).await?;

    tracing::info!(
        admin_id = %session.user_id,
        target_user_id = %target,
        amount = %credits,
        balance_before = %balance_before,
        new_balance = %new_balance,
        "Credit granted"
    );

    let entry = NewAuditEntry::new(
        session.user_id,
        AuditAction::CreditGrant,
        json!({
            "target_user_id": target.to_string(),
            "amount": credits,
            "balance_before": balance_before,
        }),
    );
    audit::record(store, session, &entry, audit_mode).await?;

    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verifiedmeasure_core::LedgerReason;
    use verifiedmeasure_store::MemoryStore;

    fn admin_session() -> Session {
        Session {
            user_id: UserId::generate(),
            email: None,
            access_token: "admin".into(),
        }
    }

    #[test]
    fn whole_credits_floors() {
        assert_eq!(whole_credits(100.0), Ok(100));
        assert_eq!(whole_credits(2.9), Ok(2));
        assert_eq!(whole_credits(0.5), Err(CoreError::InvalidAmount));
        assert_eq!(whole_credits(0.0), Err(CoreError::InvalidAmount));
        assert_eq!(whole_credits(-3.0), Err(CoreError::InvalidAmount));
        assert_eq!(whole_credits(f64::NAN), Err(CoreError::InvalidAmount));
        assert_eq!(whole_credits(f64::INFINITY), Err(CoreError::InvalidAmount));
    }

    #[tokio::test]
    async fn grant_adds_one_ledger_row() {
        let store = MemoryStore::new();
        let admin = admin_session();
        let target = UserId::generate();
        store.seed_credit(target, 5).await;

        let new_balance = grant_credit(
            &store,
            &admin,
            &target.to_string(),
            100.0,
            AuditMode::Strict,
        )
        .await
        .unwrap();

        assert_eq!(new_balance, 105);
        let ledger = store.ledger_entries(&target).await;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].delta, 100);
        assert_eq!(ledger[1].reason, LedgerReason::AdminGrant);
        assert_eq!(ledger[1].meta["granted_by"], admin.user_id.to_string());

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::CreditGrant);
        assert_eq!(audit[0].entity, "credit_ledger");
        assert_eq!(audit[0].meta["amount"], 100);
        assert_eq!(audit[0].meta["balance_before"], 5);
        assert_eq!(audit[0].meta["target_user_id"], target.to_string());
    }

    #[tokio::test]
    async fn blank_user_id_is_rejected_first() {
        let store = MemoryStore::new();
        let err = grant_credit(&store, &admin_session(), "   ", -1.0, AuditMode::BestEffort)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "user_id required"));
    }

    #[tokio::test]
    async fn bad_amount_writes_nothing() {
        let store = MemoryStore::new();
        let target = UserId::generate();
        let err = grant_credit(&store, &admin_session(), &target.to_string(), 0.0, AuditMode::BestEffort)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(ref m) if m == "amount must be positive"));
        assert!(store.ledger_entries(&target).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_user_id_is_rejected() {
        let store = MemoryStore::new();
        let err = grant_credit(&store, &admin_session(), "someone", 10.0, AuditMode::BestEffort)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "invalid user_id"));
    }
}
