//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - any caller with a valid bearer token
//! - `AdminAuth` - a caller that also passes the data service's admin predicate
//!
//! Tokens are verified locally (HS256) when a JWT secret is configured and
//! resolved through the auth provider otherwise.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use verifiedmeasure_core::UserId;
use verifiedmeasure_store::Session;

use crate::error::ApiError;
use crate::state::AppState;

const MISSING_HEADER: &str = "Missing Authorization header.";
const MISSING_TOKEN: &str = "Missing bearer token.";
const INVALID_SESSION: &str = "Invalid session.";
const ADMIN_REQUIRED: &str = "Admin required.";

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The resolved session; store calls made on the caller's behalf use it.
    pub session: Session,
}

impl AuthUser {
    /// The caller's user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.session.user_id
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header)?;

        let session = match &state.config.jwt_secret {
            Some(secret) => verify_jwt(token, secret, &state.config.jwt_audience)?,
            None => state.store.authenticate(token).await?,
        };

        tracing::debug!(user_id = %session.user_id, "Caller authenticated");
        Ok(Self { session })
    }
}

/// An authenticated caller that passed the admin predicate.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// The admin's session.
    pub session: Session,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { session } = AuthUser::from_request_parts(parts, state).await?;

        // A failing predicate call is an auth failure too.
        let is_admin = state
            .store
            .is_admin(&session)
            .await
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;
        if !is_admin {
            tracing::debug!(user_id = %session.user_id, "Admin check failed");
            return Err(ApiError::unauthorized(ADMIN_REQUIRED));
        }

        tracing::info!(admin_id = %session.user_id, "Admin authenticated");
        Ok(Self { session })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` when the header is missing, uses another
/// scheme, or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiError> {
    const SCHEME: &str = "bearer ";

    let header = header.ok_or_else(|| ApiError::unauthorized(MISSING_HEADER))?;
    let has_scheme = header
        .get(..SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME));
    if !has_scheme {
        return Err(ApiError::unauthorized(MISSING_HEADER));
    }

    let token = header[SCHEME.len()..].trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized(MISSING_TOKEN));
    }
    Ok(token)
}

/// Claims read from a locally verified session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id).
    pub sub: String,
    /// Audience (string or array).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Email, when the issuer includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time.
    pub exp: i64,
}

/// Verify an HS256 token and turn it into a session.
fn verify_jwt(token: &str, secret: &str, audience: &str) -> Result<Session, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::unauthorized(INVALID_SESSION)
        })?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::unauthorized(INVALID_SESSION))?;

    Ok(Session {
        user_id,
        email: data.claims.email,
        access_token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(sub: &str, aud: &str, secret: &str) -> String {
        let claims = JwtClaims {
            sub: sub.into(),
            aud: Some(serde_json::json!(aud)),
            email: Some("ops@acme.io".into()),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(m) => m,
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bEaReR   abc  ")).unwrap(), "abc");
    }

    #[test]
    fn bearer_errors() {
        assert_eq!(message(bearer_token(None).unwrap_err()), MISSING_HEADER);
        assert_eq!(message(bearer_token(Some("Basic abc")).unwrap_err()), MISSING_HEADER);
        assert_eq!(message(bearer_token(Some("Bearer    ")).unwrap_err()), MISSING_TOKEN);
    }

    #[test]
    fn valid_jwt_yields_session() {
        let user = UserId::generate();
        let jwt = token(&user.to_string(), "authenticated", "secret");

        let session = verify_jwt(&jwt, "secret", "authenticated").unwrap();

        assert_eq!(session.user_id, user);
        assert_eq!(session.email.as_deref(), Some("ops@acme.io"));
        assert_eq!(session.access_token, jwt);
    }

    #[test]
    fn jwt_with_wrong_secret_or_audience_is_rejected() {
        let user = UserId::generate().to_string();

        let wrong_secret = token(&user, "authenticated", "other");
        assert_eq!(message(verify_jwt(&wrong_secret, "secret", "authenticated").unwrap_err()), INVALID_SESSION);

        let wrong_aud = token(&user, "anon", "secret");
        assert!(verify_jwt(&wrong_aud, "secret", "authenticated").is_err());
    }

    #[test]
    fn jwt_subject_must_be_a_user_id() {
        let jwt = token("service-account", "authenticated", "secret");
        assert!(verify_jwt(&jwt, "secret", "authenticated").is_err());
    }
}
