//! VerifiedMeasure HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use verifiedmeasure_core::{AccessType, LeadId, UserId};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BalanceResponse, ClaimRequest, ClaimResponse, EmailCheckRequest,
    EmailCheckResponse, GrantCreditRequest, GrantCreditResponse, ImportLeadsRequest,
    ImportResponse, ImportRow, LeadsResponse, LedgerPage, MeResponse, SignUpRequest,
    SignUpResponse,
};

/// VerifiedMeasure API client.
///
/// Acts on behalf of one user: every authenticated call carries that user's
/// bearer token.
#[derive(Debug, Clone)]
pub struct VerifiedMeasureClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl VerifiedMeasureClient {
    /// Create a client for the user owning `access_token`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://verifiedmeasure:8080"`)
    /// * `access_token` - Session token of the acting user
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, Some(access_token.into()), ClientOptions::default())
    }

    /// Create a client without a session, for signup and the email check.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn anonymous(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, None, ClientOptions::default())
    }

    /// Create a client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        access_token: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    // =========================================================================
    // Entitlements
    // =========================================================================

    /// Claim leads. Only leads not already held are charged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientCredits` if the balance does not cover
    /// the net-new leads, or another error if the request fails.
    pub async fn claim(
        &self,
        lead_ids: &[LeadId],
        access_type: AccessType,
    ) -> Result<ClaimResponse, ClientError> {
        let request = ClaimRequest {
            lead_ids: lead_ids.to_vec(),
            access_type,
        };
        let response = self
            .authed(self.client.post(self.url("/api/claim")))?
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List the lead pool, optionally filtered by a search string.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_leads(&self, query: Option<&str>) -> Result<LeadsResponse, ClientError> {
        let mut request = self.client.get(self.url("/api/leads"));
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }
        let response = self.authed(request)?.send().await?;

        self.handle_response(response).await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Identity, balance and admin flag of the acting user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn me(&self) -> Result<MeResponse, ClientError> {
        let response = self
            .authed(self.client.get(self.url("/api/me")))?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Current balance of the acting user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn balance(&self) -> Result<i64, ClientError> {
        let response = self
            .authed(self.client.get(self.url("/api/balance")))?
            .send()
            .await?;

        let body: BalanceResponse = self.handle_response(response).await?;
        Ok(body.balance)
    }

    /// One page of the acting user's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn ledger(&self, limit: usize, offset: usize) -> Result<LedgerPage, ClientError> {
        let response = self
            .authed(self.client.get(self.url("/api/ledger")))?
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Grant whole credits to a user (admin only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the acting user is not an admin,
    /// or another error if the request fails.
    pub async fn grant_credit(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> Result<GrantCreditResponse, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/api/admin/grant-credit")))?
            .json(&GrantCreditRequest { user_id, amount })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Import leads from structured rows (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn import_leads(&self, rows: &[ImportRow]) -> Result<ImportResponse, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/api/admin/import-leads")))?
            .json(&ImportLeadsRequest { rows })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Import leads from CSV text with a header row (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn import_csv(&self, csv: impl Into<String>) -> Result<ImportResponse, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/api/admin/import-csv")))?
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(csv.into())
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =========================================================================
    // Public
    // =========================================================================

    /// Register a new user with a work email.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with the server's message on rejection.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/signup"))
            .json(&SignUpRequest { email, password })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ask the server whether an address counts as a work email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn check_email(&self, email: &str) -> Result<EmailCheckResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/email/check"))
            .json(&EmailCheckRequest { email })
            .send()
            .await?;

        self.handle_response(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ClientError::Unauthorized("client has no access token".into()))?;
        Ok(request.bearer_auth(token))
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;
        let Ok(api_error) = error_body else {
            return Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        tracing::debug!(
            status = %status,
            code = ?api_error.code,
            message = %api_error.error,
            "API request failed"
        );

        match api_error.code.as_deref() {
            Some("insufficient_credits") => Err(ClientError::InsufficientCredits {
                balance: api_error.balance.unwrap_or(0),
                required: api_error.required.unwrap_or(0),
            }),
            _ if status == reqwest::StatusCode::UNAUTHORIZED => {
                Err(ClientError::Unauthorized(api_error.error))
            }
            code => Err(ClientError::Api {
                code: code.unwrap_or("unknown").to_string(),
                message: api_error.error,
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
