//! Public signup handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use verifiedmeasure_core::{is_work_email, UserId};

use crate::error::ApiError;
use crate::extract::LooseJson;
use crate::state::AppState;

/// Shortest password accepted at signup, after trimming.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// Always true.
    pub success: bool,
    /// The new user's id.
    pub user_id: UserId,
    /// True when the provider withheld a session until the address is
    /// confirmed.
    pub confirmation_required: bool,
}

/// `POST /api/signup`
///
/// Body: `{email, password}`. Only work addresses may register.
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    body: LooseJson,
) -> Result<Json<SignUpResponse>, ApiError> {
    let email = body.text("email").unwrap_or_default().trim().to_string();
    let password = body.text("password").unwrap_or_default().trim().to_string();

    if !is_work_email(&email) {
        return Err(ApiError::validation("Use a work email address."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("Password must be at least 8 characters."));
    }

    let outcome = state.store.sign_up(&email, &password).await?;
    let confirmation_required = outcome.access_token.is_none();

    tracing::info!(
        user_id = %outcome.user_id,
        confirmation_required = %confirmation_required,
        "User signed up"
    );

    Ok(Json(SignUpResponse {
        success: true,
        user_id: outcome.user_id,
        confirmation_required,
    }))
}

/// Email check response.
#[derive(Debug, Serialize)]
pub struct EmailCheckResponse {
    /// The address as submitted, trimmed.
    pub email: String,
    /// Whether the address counts as a work email.
    pub work_email: bool,
}

/// `POST /api/email/check`
pub async fn check_email(body: LooseJson) -> Json<EmailCheckResponse> {
    let email = body.text("email").unwrap_or_default().trim().to_string();
    let work_email = is_work_email(&email);
    Json(EmailCheckResponse { email, work_email })
}
