//! Hosted data-service backend.
//!
//! Speaks the PostgREST dialect for tables (`/rest/v1/<table>`) and stored
//! procedures (`/rest/v1/rpc/<name>`), and the GoTrue dialect for auth
//! (`/auth/v1/...`). Every request carries the project API key; table and RPC
//! calls carry the caller's own bearer token so the service's row-level
//! policies apply to the caller rather than to this process.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use verifiedmeasure_core::{
    CreditLedgerEntry, Lead, LeadAccess, LeadId, NewAuditEntry, NewLead, NewLedgerEntry, UserId,
};

use crate::error::{Result, StoreError};
use crate::schema::{rpc, Table};
use crate::{Session, SignUpOutcome, Store};

/// Header carrying the project API key.
const API_KEY_HEADER: &str = "apikey";

/// PostgREST preference header.
const PREFER_HEADER: &str = "Prefer";

/// REST client for the hosted data service.
///
/// Built once at startup; `reqwest::Client` pools connections internally so
/// clones share them.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Error body shapes returned by the REST and auth endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<Value>,
}

/// User record returned by the auth provider.
#[derive(Debug, Deserialize)]
struct AuthUserRecord {
    id: UserId,
    email: Option<String>,
}

/// Row shape of `lead_access` when only the lead column is selected.
#[derive(Debug, Deserialize)]
struct LeadIdRow {
    lead_id: LeadId,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl RestStore {
    /// Create a new REST backend.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Data service URL (e.g., `"https://project.example.co"`)
    /// * `api_key` - Project API key sent with every request
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(bearer)
    }

    /// Start a request that runs with the caller's privileges.
    fn as_caller(&self, method: Method, url: &str, session: &Session) -> RequestBuilder {
        self.request(method, url, &session.access_token)
    }

    async fn call_rpc(&self, session: &Session, function: &str, args: &Value) -> Result<Value> {
        tracing::debug!(function = %function, "Calling stored procedure");

        let response = self
            .as_caller(Method::POST, &self.rpc_url(function), session)
            .json(args)
            .send()
            .await?;

        decode(response).await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: Table,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .as_caller(Method::GET, &self.table_url(table), session)
            .query(query)
            .send()
            .await?;

        decode(response).await
    }

    async fn insert<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        table: Table,
        rows: &T,
    ) -> Result<()> {
        tracing::debug!(table = %table, "Inserting rows");

        let response = self
            .as_caller(Method::POST, &self.table_url(table), session)
            .header(PREFER_HEADER, "return=minimal")
            .json(rows)
            .send()
            .await?;

        expect_success(response).await
    }
}

#[async_trait::async_trait]
impl Store for RestStore {
    async fn authenticate(&self, access_token: &str) -> Result<Session> {
        let response = self
            .request(Method::GET, &self.auth_url("user"), access_token)
            .send()
            .await?;

        // Any client-side rejection from the auth endpoint means the token is unusable.
        let user: AuthUserRecord = match decode(response).await {
            Err(StoreError::Upstream { status, message, .. }) if status < 500 => {
                return Err(StoreError::Unauthorized(message));
            }
            other => other?,
        };

        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token: access_token.to_string(),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let response = self
            .request(Method::POST, &self.auth_url("signup"), &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: Value = decode(response).await?;

        // With auto-confirm the provider returns a session wrapping the user;
        // otherwise it returns the bare user record.
        let user = body.get("user").filter(|u| !u.is_null()).unwrap_or(&body);
        let user_id = user
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("signup response has no user id".into()))?
            .parse::<UserId>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(SignUpOutcome {
            user_id,
            access_token,
        })
    }

    async fn is_admin(&self, session: &Session) -> Result<bool> {
        let value = self
            .call_rpc(session, rpc::IS_ADMIN, &serde_json::json!({}))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn get_user_balance(&self, session: &Session, user_id: &UserId) -> Result<i64> {
        let value = self
            .call_rpc(
                session,
                rpc::GET_USER_BALANCE,
                &serde_json::json!({ "in_user_id": user_id }),
            )
            .await?;
        balance_from(&value)
    }

    async fn insert_ledger_entry(&self, session: &Session, entry: &NewLedgerEntry) -> Result<()> {
        self.insert(session, Table::CreditLedger, entry).await
    }

    async fn list_ledger_entries(
        &self,
        session: &Session,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditLedgerEntry>> {
        self.select(
            session,
            Table::CreditLedger,
            &[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    async fn entitled_lead_ids(
        &self,
        session: &Session,
        user_id: &UserId,
        lead_ids: &[LeadId],
    ) -> Result<HashSet<LeadId>> {
        if lead_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let list = lead_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let rows: Vec<LeadIdRow> = self
            .select(
                session,
                Table::LeadAccess,
                &[
                    ("select", "lead_id".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("lead_id", format!("in.({list})")),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.lead_id).collect())
    }

    async fn list_entitlements(&self, session: &Session, user_id: &UserId) -> Result<HashSet<LeadId>> {
        let rows: Vec<LeadIdRow> = self
            .select(
                session,
                Table::LeadAccess,
                &[
                    ("select", "lead_id".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.lead_id).collect())
    }

    async fn insert_lead_access(&self, session: &Session, rows: &[LeadAccess]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.insert(session, Table::LeadAccess, rows).await
    }

    async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>> {
        self.select(
            session,
            Table::Leads,
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_leads(&self, session: &Session, leads: &[NewLead]) -> Result<usize> {
        if leads.is_empty() {
            return Ok(0);
        }

        tracing::debug!(rows = leads.len(), "Inserting leads");

        let response = self
            .as_caller(Method::POST, &self.table_url(Table::Leads), session)
            .query(&[("select", "id")])
            .header(PREFER_HEADER, "return=representation")
            .json(leads)
            .send()
            .await?;

        let inserted: Vec<Value> = decode(response).await?;
        Ok(inserted.len())
    }

    async fn insert_audit_entry(&self, session: &Session, entry: &NewAuditEntry) -> Result<()> {
        self.insert(session, Table::AuditLog, entry).await
    }
}

/// Decode a successful JSON response or convert an error response.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(upstream_error(response).await);
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Accept any success status, ignoring the body.
async fn expect_success(response: Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(upstream_error(response).await)
    }
}

/// Build an upstream error, keeping the service's own message.
async fn upstream_error(response: Response) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let message = body
        .message
        .or(body.msg)
        .or(body.error_description)
        .or(body.error)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    let code = body.code.map(|c| match c {
        Value::String(s) => s,
        other => other.to_string(),
    });

    tracing::debug!(status = %status, message = %message, "Data service returned an error");

    StoreError::Upstream {
        status: status.as_u16(),
        message,
        code,
    }
}

/// Interpret the aggregation procedure's result.
#[allow(clippy::cast_possible_truncation)]
fn balance_from(value: &Value) -> Result<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .ok_or_else(|| StoreError::Decode(format!("balance out of range: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| StoreError::Decode(format!("balance is not a number: {s}"))),
        other => Err(StoreError::Decode(format!("balance is not a number: {other}"))),
    }
}
