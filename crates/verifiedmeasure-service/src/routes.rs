//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, admin, claim, health, leads, signup};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for admin endpoints. Imports can be large.
const ADMIN_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /api/signup` - Register with a work email
/// - `POST /api/email/check` - Work-email check
///
/// ## Authenticated (bearer token)
/// - `POST /api/claim` - Claim leads
/// - `GET /api/leads` - Lead preview (masked unless entitled)
/// - `GET /api/me` - Identity, balance and admin flag
/// - `GET /api/balance` - Current balance
/// - `GET /api/ledger` - Ledger history
///
/// ## Admin (bearer token + admin predicate)
/// - `POST /api/admin/grant-credit` - Grant credit
/// - `POST /api/admin/import-leads` - Import JSON rows
/// - `POST /api/admin/import-csv` - Import CSV text
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let admin_routes = Router::new()
        .route("/grant-credit", post(admin::grant_credit))
        .route("/import-leads", post(admin::import_leads))
        .route("/import-csv", post(admin::import_csv))
        .layer(ConcurrencyLimitLayer::new(ADMIN_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Entitlements
        .route("/claim", post(claim::claim))
        .route("/leads", get(leads::list_leads))
        // Account
        .route("/me", get(account::me))
        .route("/balance", get(account::get_balance))
        .route("/ledger", get(account::list_ledger))
        // Signup
        .route("/signup", post(signup::sign_up))
        .route("/email/check", post(signup::check_email))
        .nest("/admin", admin_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
