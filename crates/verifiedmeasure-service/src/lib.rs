//! VerifiedMeasure HTTP API Service.
//!
//! This crate provides the HTTP API for the lead marketplace:
//!
//! - Lead preview with per-viewer masking
//! - Credit-gated lead claims
//! - Admin credit grants and bulk lead imports (JSON rows or CSV)
//! - Balance, ledger history and signup
//!
//! # Authentication
//!
//! Every route except `/health`, `/api/signup` and `/api/email/check` needs
//! `Authorization: Bearer <token>`. Tokens are verified locally when
//! `JWT_SECRET` is set and resolved through the data service's auth provider
//! otherwise. Admin routes additionally require the `is_admin` predicate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers without awaits still need to be async

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod workflows;

pub use config::{AuditMode, ServiceConfig, StoreBackend};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
