//! Storage layer for VerifiedMeasure.
//!
//! Every piece of persistent state lives in an external data service that
//! owns authentication, row-level security and two stored procedures
//! (`is_admin`, `get_user_balance`). This crate puts that service behind the
//! [`Store`] trait so the HTTP layer never depends on a concrete backend.
//!
//! # Backends
//!
//! - [`RestStore`]: the hosted backend, spoken to over HTTP (PostgREST-style
//!   tables and RPC, GoTrue-style auth).
//! - [`MemoryStore`]: an in-process backend for local development and tests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use verifiedmeasure_store::{RestStore, Store};
//!
//! # async fn example() -> verifiedmeasure_store::Result<()> {
//! let store = RestStore::new("https://project.example.co", "anon-key", Duration::from_secs(30))?;
//!
//! // Resolve a bearer token to a session, then read that user's balance
//! let session = store.authenticate("user-access-token").await?;
//! let balance = store.get_user_balance(&session, &session.user_id).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod rest;
pub mod schema;

use std::collections::HashSet;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use schema::Table;

use verifiedmeasure_core::{
    CreditLedgerEntry, Lead, LeadAccess, LeadId, NewAuditEntry, NewLead, NewLedgerEntry, UserId,
};

/// An authenticated caller.
///
/// The access token travels with the session so a backend can act with the
/// caller's own privileges (row-level policies apply per caller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's email, when the auth provider reported one.
    pub email: Option<String>,
    /// The bearer token the session was resolved from.
    pub access_token: String,
}

/// Result of a signup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// The new user's id.
    pub user_id: UserId,
    /// A session token, when the provider signed the user in immediately.
    /// `None` means the address must be confirmed first.
    pub access_token: Option<String>,
}

/// The storage trait defining all data-service operations.
///
/// Every operation is a single round trip. Nothing is cached, and no method
/// spans more than one statement; multi-step workflows are composed by the
/// caller.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Auth Provider
    // =========================================================================

    /// Resolve a bearer token to a session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthorized` if the provider rejects the token.
    async fn authenticate(&self, access_token: &str) -> Result<Session>;

    /// Register a new user with the auth provider.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Upstream` with the provider's message on rejection.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Evaluate the session-scoped admin predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the procedure call fails.
    async fn is_admin(&self, session: &Session) -> Result<bool>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Aggregate a user's ledger into a balance. A missing result counts as 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the procedure call fails.
    async fn get_user_balance(&self, session: &Session, user_id: &UserId) -> Result<i64>;

    /// Append one ledger row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn insert_ledger_entry(&self, session: &Session, entry: &NewLedgerEntry) -> Result<()>;

    /// List a user's ledger rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    async fn list_ledger_entries(
        &self,
        session: &Session,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditLedgerEntry>>;

    // =========================================================================
    // Entitlement Operations
    // =========================================================================

    /// Return the subset of `lead_ids` the user is already entitled to.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    async fn entitled_lead_ids(
        &self,
        session: &Session,
        user_id: &UserId,
        lead_ids: &[LeadId],
    ) -> Result<HashSet<LeadId>>;

    /// Return every lead the user is entitled to.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    async fn list_entitlements(&self, session: &Session, user_id: &UserId) -> Result<HashSet<LeadId>>;

    /// Insert entitlement rows in one statement.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Upstream` if any pair already exists (the whole
    /// batch is rejected) or the insert otherwise fails.
    async fn insert_lead_access(&self, session: &Session, rows: &[LeadAccess]) -> Result<()>;

    // =========================================================================
    // Lead Operations
    // =========================================================================

    /// List the whole lead pool, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>>;

    /// Insert leads in one statement and return how many rows were created.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn insert_leads(&self, session: &Session, leads: &[NewLead]) -> Result<usize>;

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Append one audit row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    async fn insert_audit_entry(&self, session: &Session, entry: &NewAuditEntry) -> Result<()>;
}
