//! Lead claim handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use verifiedmeasure_core::{AccessType, LeadId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::LooseJson;
use crate::state::AppState;
use crate::workflows;

/// Claim response.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    /// Always true.
    pub success: bool,
    /// Credits charged.
    pub cost: i64,
    /// Well-formed ids in the request.
    pub claimed: usize,
    /// Leads newly entitled by this claim.
    pub newly_claimed_ids: Vec<LeadId>,
    /// Balance after the claim.
    pub new_balance: i64,
}

/// `POST /api/claim`
///
/// Body: `{lead_ids: string[], access_type?: "download" | "export"}`.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: LooseJson,
) -> Result<Json<ClaimResponse>, ApiError> {
    let lead_ids: Vec<String> = body
        .array("lead_ids")
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let access_type = match body.text("access_type") {
        Some(raw) => raw.parse::<AccessType>()?,
        None => AccessType::default(),
    };

    let outcome = workflows::claim(
        state.store.as_ref(),
        &state.claim_locks,
        &auth.session,
        &lead_ids,
        access_type,
        state.config.audit_mode,
    )
    .await?;

    Ok(Json(ClaimResponse {
        success: true,
        cost: outcome.cost,
        claimed: outcome.claimed,
        newly_claimed_ids: outcome.newly_claimed_ids,
        new_balance: outcome.new_balance,
    }))
}
