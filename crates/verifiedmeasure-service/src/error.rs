//! API error types and responses.

use axum::extract::rejection::{BytesRejection, QueryRejection, StringRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use verifiedmeasure_core::CoreError;
use verifiedmeasure_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid credentials, or the admin check failed.
    #[error("{0}")]
    Unauthorized(String),

    /// Invalid input.
    #[error("{0}")]
    Validation(String),

    /// The net-new cost of a claim exceeds the caller's balance.
    #[error("Insufficient credits.")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The request body exceeds the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The data service (or the path to it) failed. The message is passed
    /// through verbatim.
    #[error("{0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for an authentication error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Map an extractor rejection. Oversized bodies keep their 413; every
    /// other malformed request is a validation error.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::Validation(message)
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::InsufficientCredits { .. } => {
                (StatusCode::PAYMENT_REQUIRED, "insufficient_credits")
            }
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            Self::Upstream(_) => (StatusCode::BAD_REQUEST, "upstream_error"),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let (balance, required) = match &self {
            Self::InsufficientCredits { balance, required } => (Some(*balance), Some(*required)),
            _ => (None, None),
        };

        let error = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code,
            balance,
            required,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized(msg) => Self::Unauthorized(msg),
            StoreError::Upstream { message, .. } => Self::Upstream(message),
            StoreError::Http(e) => Self::Upstream(e.to_string()),
            StoreError::Decode(msg) => Self::Upstream(format!("unexpected response: {msg}")),
            StoreError::Configuration(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<StringRejection> for ApiError {
    fn from(rejection: StringRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}
