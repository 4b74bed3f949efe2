//! Request and response types for the VerifiedMeasure API.

use serde::{Deserialize, Serialize};

use verifiedmeasure_core::{AccessType, CreditLedgerEntry, LeadId, LeadView, UserId};

// ============================================================================
// Requests
// ============================================================================

/// Claim request body.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimRequest {
    /// Leads to claim.
    pub lead_ids: Vec<LeadId>,
    /// Intended use.
    pub access_type: AccessType,
}

/// Grant request body.
#[derive(Debug, Clone, Serialize)]
pub struct GrantCreditRequest {
    /// Target user.
    pub user_id: UserId,
    /// Whole credits to add.
    pub amount: i64,
}

/// One row of a JSON lead import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportRow {
    /// Company name (required by the server).
    pub company: String,
    /// Website.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Free-form attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportLeadsRequest<'a> {
    pub rows: &'a [ImportRow],
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailCheckRequest<'a> {
    pub email: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

/// Claim result.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    /// Credits charged.
    pub cost: i64,
    /// Well-formed ids the server counted.
    pub claimed: usize,
    /// Leads that became entitled with this claim.
    pub newly_claimed_ids: Vec<LeadId>,
    /// Balance after the claim.
    pub new_balance: i64,
}

/// Grant result.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantCreditResponse {
    /// Target's balance after the grant.
    pub new_balance: i64,
}

/// Import result.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    /// Rows inserted.
    pub imported: usize,
    /// Rows recognised in CSV text (CSV import only).
    #[serde(default)]
    pub parsed: Option<usize>,
}

/// Lead preview page.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadsResponse {
    /// Leads, masked unless entitled.
    pub leads: Vec<LeadView>,
    /// Size of the pool.
    pub total: usize,
    /// Leads the caller holds.
    pub entitled: usize,
    /// Leads still available.
    pub available: usize,
}

/// Caller identity.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's email, when known.
    #[serde(default)]
    pub email: Option<String>,
    /// Current balance.
    pub balance: i64,
    /// Whether the caller is an admin.
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    pub balance: i64,
}

/// One page of ledger history.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerPage {
    /// Rows, newest first.
    pub entries: Vec<CreditLedgerEntry>,
    /// Whether more rows follow.
    pub has_more: bool,
}

/// Signup result.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpResponse {
    /// The new user's id.
    pub user_id: UserId,
    /// True when the address must be confirmed before signing in.
    pub confirmation_required: bool,
}

/// Work-email check result.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailCheckResponse {
    /// The address, trimmed.
    pub email: String,
    /// Whether it counts as a work email.
    pub work_email: bool,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub balance: Option<i64>,
    #[serde(default)]
    pub required: Option<i64>,
}
