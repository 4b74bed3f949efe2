//! In-process backend.
//!
//! Mirrors the guarantees the hosted service gives per statement: each call
//! is atomic, `lead_access` rejects duplicate pairs for the whole batch, and
//! the balance procedure sums the ledger on every call. Row-level policies
//! are not modelled.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;

use verifiedmeasure_core::{
    balance_of, AuditEntryId, AuditLogEntry, CreditLedgerEntry, Lead, LeadAccess, LeadId,
    LedgerEntryId, LedgerReason, NewAuditEntry, NewLead, NewLedgerEntry, UserId,
};

use crate::error::{Result, StoreError};
use crate::schema::Table;
use crate::{Session, SignUpOutcome, Store};

/// Message returned for a token with no registered session.
const INVALID_SESSION: &str = "Invalid session.";

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, (UserId, Option<String>)>,
    users_by_email: HashMap<String, UserId>,
    admins: HashSet<UserId>,
    leads: Vec<Lead>,
    lead_access: Vec<LeadAccess>,
    ledger: Vec<CreditLedgerEntry>,
    audit: Vec<AuditLogEntry>,
    failures: HashMap<Table, String>,
}

impl Inner {
    fn check_failure(&self, table: Table) -> Result<()> {
        match self.failures.get(&table) {
            Some(message) => Err(StoreError::upstream(400, message.clone())),
            None => Ok(()),
        }
    }
}

/// In-memory data service.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Make `access_token` resolve to `user_id`.
    pub async fn register_session(&self, access_token: impl Into<String>, user_id: UserId) {
        self.inner
            .write()
            .await
            .sessions
            .insert(access_token.into(), (user_id, None));
    }

    /// Grant the admin capability to a user.
    pub async fn add_admin(&self, user_id: UserId) {
        self.inner.write().await.admins.insert(user_id);
    }

    /// Append a ledger row directly, bypassing every workflow.
    pub async fn seed_credit(&self, user_id: UserId, delta: i64) {
        self.inner.write().await.ledger.push(CreditLedgerEntry {
            id: LedgerEntryId::generate(),
            user_id,
            delta,
            reason: LedgerReason::Other,
            meta: serde_json::json!({ "seeded": true }),
            created_at: Utc::now(),
        });
    }

    /// Insert leads directly and return their ids in input order.
    pub async fn seed_leads(&self, leads: &[NewLead]) -> Vec<LeadId> {
        let mut inner = self.inner.write().await;
        leads
            .iter()
            .map(|lead| {
                let stored = materialize(lead);
                let id = stored.id;
                inner.leads.push(stored);
                id
            })
            .collect()
    }

    /// Entitle a user to a lead directly.
    pub async fn seed_access(&self, user_id: UserId, lead_id: LeadId) {
        self.inner
            .write()
            .await
            .lead_access
            .push(LeadAccess::new(user_id, lead_id));
    }

    /// Make every write to `table` fail with `message`.
    pub async fn fail_writes(&self, table: Table, message: impl Into<String>) {
        self.inner.write().await.failures.insert(table, message.into());
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Every ledger row of a user, oldest first.
    pub async fn ledger_entries(&self, user_id: &UserId) -> Vec<CreditLedgerEntry> {
        self.inner
            .read()
            .await
            .ledger
            .iter()
            .filter(|e| e.user_id == *user_id)
            .cloned()
            .collect()
    }

    /// Every entitlement row of a user, in insertion order.
    pub async fn access_rows(&self, user_id: &UserId) -> Vec<LeadAccess> {
        self.inner
            .read()
            .await
            .lead_access
            .iter()
            .filter(|a| a.user_id == *user_id)
            .copied()
            .collect()
    }

    /// Every audit row, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.inner.read().await.audit.clone()
    }

    /// Number of leads in the pool.
    pub async fn lead_count(&self) -> usize {
        self.inner.read().await.leads.len()
    }

    /// Balance as the sum of a user's ledger deltas.
    pub async fn balance(&self, user_id: &UserId) -> i64 {
        balance_of(user_id, &self.inner.read().await.ledger)
    }
}

fn materialize(lead: &NewLead) -> Lead {
    Lead {
        id: LeadId::generate(),
        company: lead.company.clone(),
        website: lead.website.clone(),
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        meta: serde_json::Value::Object(lead.meta.clone()),
        created_at: Utc::now(),
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn authenticate(&self, access_token: &str) -> Result<Session> {
        let inner = self.inner.read().await;
        let (user_id, email) = inner
            .sessions
            .get(access_token)
            .cloned()
            .ok_or_else(|| StoreError::Unauthorized(INVALID_SESSION.into()))?;

        Ok(Session {
            user_id,
            email,
            access_token: access_token.to_string(),
        })
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome> {
        let mut inner = self.inner.write().await;
        let key = email.to_lowercase();
        if inner.users_by_email.contains_key(&key) {
            return Err(StoreError::upstream(422, "User already registered"));
        }

        let user_id = UserId::generate();
        let access_token = format!("memory-session-{}", uuid::Uuid::new_v4());
        inner.users_by_email.insert(key, user_id);
        inner
            .sessions
            .insert(access_token.clone(), (user_id, Some(email.to_string())));

        Ok(SignUpOutcome {
            user_id,
            access_token: Some(access_token),
        })
    }

    async fn is_admin(&self, session: &Session) -> Result<bool> {
        Ok(self.inner.read().await.admins.contains(&session.user_id))
    }

    async fn get_user_balance(&self, _session: &Session, user_id: &UserId) -> Result<i64> {
        Ok(self.balance(user_id).await)
    }

    async fn insert_ledger_entry(&self, _session: &Session, entry: &NewLedgerEntry) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_failure(Table::CreditLedger)?;

        inner.ledger.push(CreditLedgerEntry {
            id: LedgerEntryId::generate(),
            user_id: entry.user_id,
            delta: entry.delta,
            reason: entry.reason,
            meta: entry.meta.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_ledger_entries(
        &self,
        _session: &Session,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditLedgerEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ledger
            .iter()
            .rev()
            .filter(|e| e.user_id == *user_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn entitled_lead_ids(
        &self,
        _session: &Session,
        user_id: &UserId,
        lead_ids: &[LeadId],
    ) -> Result<HashSet<LeadId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .lead_access
            .iter()
            .filter(|a| a.user_id == *user_id && lead_ids.contains(&a.lead_id))
            .map(|a| a.lead_id)
            .collect())
    }

    async fn list_entitlements(&self, _session: &Session, user_id: &UserId) -> Result<HashSet<LeadId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .lead_access
            .iter()
            .filter(|a| a.user_id == *user_id)
            .map(|a| a.lead_id)
            .collect())
    }

    async fn insert_lead_access(&self, _session: &Session, rows: &[LeadAccess]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_failure(Table::LeadAccess)?;

        let mut seen: HashSet<LeadAccess> = inner.lead_access.iter().copied().collect();
        if let Some(dup) = rows.iter().find(|row| !seen.insert(**row)) {
            return Err(StoreError::Upstream {
                status: 409,
                message: format!(
                    "duplicate key value violates unique constraint \"lead_access_pkey\" ({}, {})",
                    dup.user_id, dup.lead_id
                ),
                code: Some("23505".into()),
            });
        }

        inner.lead_access.extend_from_slice(rows);
        Ok(())
    }

    async fn list_leads(&self, _session: &Session) -> Result<Vec<Lead>> {
        let inner = self.inner.read().await;
        let mut leads = inner.leads.clone();
        // Stable sort keeps insertion order for equal timestamps; reverse it so
        // the most recent import still comes first.
        leads.reverse();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn insert_leads(&self, _session: &Session, leads: &[NewLead]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.check_failure(Table::Leads)?;

        inner.leads.extend(leads.iter().map(materialize));
        Ok(leads.len())
    }

    async fn insert_audit_entry(&self, _session: &Session, entry: &NewAuditEntry) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.check_failure(Table::AuditLog)?;

        inner.audit.push(AuditLogEntry {
            id: AuditEntryId::generate(),
            actor_id: entry.actor_id,
            action: entry.action,
            entity: entry.entity.clone(),
            entity_id: entry.entity_id.clone(),
            meta: entry.meta.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}
