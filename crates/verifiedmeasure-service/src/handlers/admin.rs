//! Admin-only handlers: credit grants and lead imports.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use verifiedmeasure_core::csv::parse_leads_csv;
use verifiedmeasure_core::RawLeadRow;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::extract::{LooseJson, TextBody};
use crate::state::AppState;
use crate::workflows;

/// Grant response.
#[derive(Debug, Serialize)]
pub struct GrantCreditResponse {
    /// Always true.
    pub success: bool,
    /// Target's balance after the grant.
    pub new_balance: i64,
}

/// `POST /api/admin/grant-credit`
///
/// Body: `{user_id, amount}`. `amount` may be a number or a numeric string.
pub async fn grant_credit(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    body: LooseJson,
) -> Result<Json<GrantCreditResponse>, ApiError> {
    let user_id = body.text("user_id").unwrap_or_default();
    let amount = body.number("amount");

    let new_balance = workflows::grant_credit(
        state.store.as_ref(),
        &admin.session,
        &user_id,
        amount,
        state.config.audit_mode,
    )
    .await?;

    Ok(Json(GrantCreditResponse {
        success: true,
        new_balance,
    }))
}

/// Import response.
#[derive(Debug, Serialize)]
pub struct ImportLeadsResponse {
    /// Always true.
    pub success: bool,
    /// Rows inserted.
    pub imported: usize,
    /// Rows recognised in the CSV text (CSV import only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<usize>,
}

/// `POST /api/admin/import-leads`
///
/// Body: `{rows: RawRow[]}`. Rows that are not objects count as rows without
/// a company.
pub async fn import_leads(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    body: LooseJson,
) -> Result<Json<ImportLeadsResponse>, ApiError> {
    let rows: Vec<RawLeadRow> = body
        .array("rows")
        .iter()
        .map(|row| match row {
            Value::Object(_) => serde_json::from_value(row.clone()).unwrap_or_default(),
            _ => RawLeadRow::default(),
        })
        .collect();

    let imported = workflows::import_rows(
        state.store.as_ref(),
        &admin.session,
        &rows,
        state.config.audit_mode,
    )
    .await?;

    Ok(Json(ImportLeadsResponse {
        success: true,
        imported,
        parsed: None,
    }))
}

/// `POST /api/admin/import-csv`
///
/// Body: raw CSV text with a header row.
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    TextBody(text): TextBody,
) -> Result<Json<ImportLeadsResponse>, ApiError> {
    let leads = parse_leads_csv(&text);
    let parsed = leads.len();
    tracing::debug!(bytes = %text.len(), parsed = %parsed, "CSV parsed");

    let imported = workflows::import_leads(
        state.store.as_ref(),
        &admin.session,
        &leads,
        state.config.audit_mode,
    )
    .await?;

    Ok(Json(ImportLeadsResponse {
        success: true,
        imported,
        parsed: Some(parsed),
    }))
}
