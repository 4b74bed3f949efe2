//! Lead claim workflow.
//!
//! A claim charges one credit per lead the caller is not yet entitled to and
//! records the entitlement. Leads already held cost nothing, so re-claiming is
//! free and never duplicates an entitlement row.

use std::collections::HashSet;

use serde_json::json;

use verifiedmeasure_core::{
    AccessType, AuditAction, CoreError, LeadAccess, LeadId, NewAuditEntry, NewLedgerEntry,
};
use verifiedmeasure_store::{Session, Store};

use crate::config::AuditMode;
use crate::error::ApiError;
use crate::workflows::{audit, ClaimLocks};

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Credits charged (number of net-new leads).
    pub cost: i64,
    /// Number of well-formed ids in the request, after de-duplication.
    pub claimed: usize,
    /// Leads that became entitled with this claim, in request order.
    pub newly_claimed_ids: Vec<LeadId>,
    /// Balance after the claim, as reported by the store.
    pub new_balance: i64,
}

/// Keep well-formed lead ids only, collapsing duplicates in first-seen order.
#[must_use]
pub fn clean_lead_ids<S: AsRef<str>>(raw: &[S]) -> Vec<LeadId> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|s| LeadId::parse_shaped(s.as_ref()))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Claim leads for the session's user.
///
/// # Errors
///
/// - `ApiError::Validation` if no well-formed id remains.
/// - `ApiError::InsufficientCredits` if the net-new cost exceeds the balance.
///   Nothing is written in that case.
/// - `ApiError::Upstream` if any store call fails. Steps after the failing
///   one are not run.
pub async fn claim<S: AsRef<str>>(
    store: &dyn Store,
    locks: &ClaimLocks,
    session: &Session,
    raw_ids: &[S],
    access_type: AccessType,
    audit_mode: AuditMode,
) -> Result<ClaimOutcome, ApiError> {
    let user_id = session.user_id;
    let requested = clean_lead_ids(raw_ids);
    if requested.is_empty() {
        return Err(CoreError::Required("lead_ids").into());
    }

    let (cost, newly_claimed_ids, new_balance) = {
        let _guard = locks.acquire(user_id).await;

        let held = store.entitled_lead_ids(session, &user_id, &requested).await?;
        let new_ids: Vec<LeadId> = requested
            .iter()
            .filter(|id| !held.contains(*id))
            .copied()
            .collect();
        let cost = i64::try_from(new_ids.len())
            .map_err(|_| ApiError::validation("too many lead_ids"))?;

        let balance = store.get_user_balance(session, &user_id).await?;
        if balance < cost {
            tracing::debug!(
                user_id = %user_id,
                balance = %balance,
                required = %cost,
                "Claim rejected: insufficient credits"
            );
            return Err(ApiError::InsufficientCredits {
                balance,
                required: cost,
            });
        }

        if cost > 0 {
            let rows: Vec<LeadAccess> = new_ids
                .iter()
                .map(|lead_id| LeadAccess::new(user_id, *lead_id))
                .collect();
            store.insert_lead_access(session, &rows).await?;
            store
                .insert_ledger_entry(session, &NewLedgerEntry::claim(user_id, cost, access_type))
                .await?;
        }

        let new_balance = store.get_user_balance(session, &user_id).await?;
        (cost, new_ids, new_balance)
    };

    tracing::info!(
        user_id = %user_id,
        requested = %requested.len(),
        cost = %cost,
        new_balance = %new_balance,
        access_type = %access_type,
        "Leads claimed"
    );

    let entry = NewAuditEntry::new(
        user_id,
        AuditAction::Claim,
        json!({
            "requested": requested.len(),
            "newly_entitled": cost,
            "access_type": access_type.as_str(),
        }),
    );
    audit::record(store, session, &entry, audit_mode).await?;

    Ok(ClaimOutcome {
        cost,
        claimed: requested.len(),
        newly_claimed_ids,
        new_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use verifiedmeasure_core::{LedgerReason, NewLead, UserId};
    use verifiedmeasure_store::{MemoryStore, Table};

    fn lead(company: &str) -> NewLead {
        NewLead {
            company: company.into(),
            website: None,
            email: None,
            phone: None,
            meta: serde_json::Map::new(),
        }
    }

    async fn setup(balance: i64, leads: usize) -> (MemoryStore, Session, Vec<String>) {
        let store = MemoryStore::new();
        let user_id = UserId::generate();
        if balance != 0 {
            store.seed_credit(user_id, balance).await;
        }
        let pool: Vec<NewLead> = (0..leads).map(|i| lead(&format!("Lead {i}"))).collect();
        let ids = store.seed_leads(&pool).await;
        let session = Session {
            user_id,
            email: None,
            access_token: "token".into(),
        };
        (store, session, ids.iter().map(ToString::to_string).collect())
    }

    async fn run(store: &MemoryStore, session: &Session, ids: &[String]) -> Result<ClaimOutcome, ApiError> {
        claim(
            store,
            &ClaimLocks::default(),
            session,
            ids,
            AccessType::Download,
            AuditMode::BestEffort,
        )
        .await
    }

    #[test]
    fn clean_filters_and_dedupes() {
        let a = LeadId::generate();
        let b = LeadId::generate();
        let raw = vec![
            a.to_string(),
            "not-a-lead".to_string(),
            b.to_string(),
            a.to_string(),
            "zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz".to_string(),
        ];
        assert_eq!(clean_lead_ids(&raw), vec![a, b]);
    }

    #[tokio::test]
    async fn rejects_when_nothing_well_formed() {
        let (store, session, _) = setup(5, 0).await;
        let err = run(&store, &session, &["abc".to_string()]).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "lead_ids required"));
    }

    #[tokio::test]
    async fn insufficient_credits_writes_nothing() {
        let (store, session, ids) = setup(3, 4).await;

        let err = run(&store, &session, &ids).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::InsufficientCredits {
                balance: 3,
                required: 4
            }
        ));
        assert_eq!(store.balance(&session.user_id).await, 3);
        assert!(store.access_rows(&session.user_id).await.is_empty());
        assert_eq!(store.ledger_entries(&session.user_id).await.len(), 1);
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn charges_one_credit_per_new_lead() {
        let (store, session, ids) = setup(3, 2).await;

        let outcome = run(&store, &session, &ids).await.unwrap();

        assert_eq!(outcome.cost, 2);
        assert_eq!(outcome.claimed, 2);
        assert_eq!(outcome.new_balance, 1);
        assert_eq!(store.access_rows(&session.user_id).await.len(), 2);

        let ledger = store.ledger_entries(&session.user_id).await;
        let debit = ledger.last().unwrap();
        assert_eq!(debit.delta, -2);
        assert_eq!(debit.reason, LedgerReason::ClaimLeads);
        assert_eq!(debit.meta["access_type"], "download");
    }

    #[tokio::test]
    async fn already_entitled_leads_are_free() {
        let (store, session, ids) = setup(3, 2).await;
        store
            .seed_access(session.user_id, ids[0].parse().unwrap())
            .await;

        let outcome = run(&store, &session, &ids).await.unwrap();

        assert_eq!(outcome.cost, 1);
        assert_eq!(outcome.newly_claimed_ids, vec![ids[1].parse::<LeadId>().unwrap()]);
        assert_eq!(outcome.new_balance, 2);
    }

    #[tokio::test]
    async fn reclaim_costs_nothing_and_skips_writes() {
        let (store, session, ids) = setup(3, 2).await;
        run(&store, &session, &ids).await.unwrap();

        let again = run(&store, &session, &ids).await.unwrap();

        assert_eq!(again.cost, 0);
        assert!(again.newly_claimed_ids.is_empty());
        assert_eq!(again.new_balance, 1);
        assert_eq!(store.access_rows(&session.user_id).await.len(), 2);
        // One seed credit plus one debit; the free re-claim adds no row.
        assert_eq!(store.ledger_entries(&session.user_id).await.len(), 2);
        // Both claims are audited.
        assert_eq!(store.audit_entries().await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_ids_are_charged_once() {
        let (store, session, ids) = setup(3, 1).await;
        let doubled = vec![ids[0].clone(), ids[0].clone()];

        let outcome = run(&store, &session, &doubled).await.unwrap();

        assert_eq!(outcome.cost, 1);
        assert_eq!(outcome.claimed, 1);
    }

    #[tokio::test]
    async fn audit_meta_records_counts() {
        let (store, session, ids) = setup(3, 2).await;
        claim(
            &store,
            &ClaimLocks::default(),
            &session,
            &ids,
            AccessType::Export,
            AuditMode::Strict,
        )
        .await
        .unwrap();

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::Claim);
        assert_eq!(audit[0].entity, "lead_access");
        assert_eq!(audit[0].entity_id, None);
        assert_eq!(
            audit[0].meta,
            json!({ "requested": 2, "newly_entitled": 2, "access_type": "export" })
        );
    }

    #[tokio::test]
    async fn failing_ledger_insert_aborts_before_audit() {
        let (store, session, ids) = setup(3, 1).await;
        store.fail_writes(Table::CreditLedger, "permission denied for table credit_ledger").await;

        let err = run(&store, &session, &ids).await.unwrap_err();

        assert!(matches!(err, ApiError::Upstream(ref m) if m == "permission denied for table credit_ledger"));
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn audit_failure_follows_mode() {
        let (store, session, ids) = setup(5, 2).await;
        store.fail_writes(Table::AuditLog, "audit_log unavailable").await;

        let best_effort = run(&store, &session, &ids[..1]).await;
        assert!(best_effort.is_ok());

        let strict = claim(
            &store,
            &ClaimLocks::default(),
            &session,
            &ids[1..],
            AccessType::Download,
            AuditMode::Strict,
        )
        .await;
        assert!(matches!(strict, Err(ApiError::Upstream(ref m)) if m == "audit_log unavailable"));

        // The mutation persisted in both cases.
        assert_eq!(store.balance(&session.user_id).await, 3);
        assert_eq!(store.access_rows(&session.user_id).await.len(), 2);
    }
}
