//! Lead preview handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use verifiedmeasure_core::{Lead, LeadView};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Lead list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsQuery {
    /// Case-insensitive search over the unmasked fields.
    #[serde(default)]
    pub q: Option<String>,
}

/// Lead list response.
#[derive(Debug, Serialize)]
pub struct ListLeadsResponse {
    /// Leads matching the search, newest first.
    pub leads: Vec<LeadView>,
    /// Size of the whole pool.
    pub total: usize,
    /// Leads the caller is entitled to.
    pub entitled: usize,
    /// Leads still available to claim.
    pub available: usize,
}

/// `GET /api/leads?q=`
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListLeadsQuery>,
) -> Result<Json<ListLeadsResponse>, ApiError> {
    let leads = state.store.list_leads(&auth.session).await?;
    let held = state
        .store
        .list_entitlements(&auth.session, &auth.user_id())
        .await?;

    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let views: Vec<LeadView> = leads
        .iter()
        .filter(|lead| needle.as_deref().map_or(true, |q| matches(lead, q)))
        .map(|lead| LeadView::render(lead, held.contains(&lead.id)))
        .collect();

    let total = leads.len();
    let entitled = held.len();

    Ok(Json(ListLeadsResponse {
        leads: views,
        total,
        entitled,
        available: total.saturating_sub(entitled),
    }))
}

/// Whether the unmasked lead contains `needle` (already lower-cased).
fn matches(lead: &Lead, needle: &str) -> bool {
    let haystack = format!(
        "{} {} {} {} {}",
        lead.company,
        lead.website.as_deref().unwrap_or_default(),
        lead.email.as_deref().unwrap_or_default(),
        lead.phone.as_deref().unwrap_or_default(),
        lead.meta
    );
    haystack.to_lowercase().contains(needle)
}
