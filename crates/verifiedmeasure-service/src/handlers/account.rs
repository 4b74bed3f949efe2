//! Caller account handlers: balance, ledger history, identity.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use verifiedmeasure_core::{CreditLedgerEntry, UserId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Largest page `GET /api/ledger` returns.
const MAX_LEDGER_PAGE: usize = 100;

/// Identity response.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's email, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Current balance.
    pub balance: i64,
    /// Whether the caller passes the admin predicate.
    pub is_admin: bool,
}

/// `GET /api/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let balance = state
        .store
        .get_user_balance(&auth.session, &auth.user_id())
        .await?;
    let is_admin = state.store.is_admin(&auth.session).await?;

    Ok(Json(MeResponse {
        user_id: auth.user_id(),
        email: auth.session.email.clone(),
        balance,
        is_admin,
    }))
}

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Sum of the caller's ledger deltas.
    pub balance: i64,
}

/// `GET /api/balance`
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .store
        .get_user_balance(&auth.session, &auth.user_id())
        .await?;

    Ok(Json(BalanceResponse { balance }))
}

/// Ledger list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListLedgerQuery {
    /// Maximum number of rows to return (default: 50, capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Ledger list response.
#[derive(Debug, Serialize)]
pub struct ListLedgerResponse {
    /// Rows, newest first.
    pub entries: Vec<CreditLedgerEntry>,
    /// Whether more rows follow this page.
    pub has_more: bool,
}

/// `GET /api/ledger?limit&offset`
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListLedgerQuery>,
) -> Result<Json<ListLedgerResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(MAX_LEDGER_PAGE);
    let mut entries = state
        .store
        .list_ledger_entries(&auth.session, &auth.user_id(), limit + 1, query.offset)
        .await?;

    let has_more = entries.len() > limit;
    entries.truncate(limit);

    Ok(Json(ListLedgerResponse { entries, has_more }))
}
