//! Service configuration.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

/// Which data-service backend the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// The hosted REST backend.
    #[default]
    Rest,
    /// The in-process backend (local development only; state is lost on exit).
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// What happens when the audit write fails after the primary mutation
/// already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditMode {
    /// Log the loss at `warn` and report success.
    #[default]
    BestEffort,
    /// Surface the audit error to the caller. The mutation still persists.
    Strict,
}

impl FromStr for AuditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown audit mode: {other}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Data-service backend (default: rest).
    pub store_backend: StoreBackend,

    /// REST backend base URL.
    pub store_url: Option<String>,

    /// REST backend project key.
    pub store_api_key: Option<String>,

    /// REST client timeout in seconds.
    pub store_timeout_seconds: u64,

    /// Shared secret for local HS256 token verification. When unset, tokens
    /// are resolved through the auth provider.
    pub jwt_secret: Option<String>,

    /// Expected JWT audience (default: "authenticated").
    pub jwt_audience: String,

    /// Audit failure policy.
    pub audit_mode: AuditMode,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Backend secrets file structure.
#[derive(Debug, Deserialize)]
struct StoreSecrets {
    url: String,
    api_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let (store_url, store_api_key) = load_store_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            store_backend: parse_env("STORE_BACKEND").unwrap_or(defaults.store_backend),
            store_url,
            store_api_key,
            store_timeout_seconds: parse_env("STORE_TIMEOUT_SECONDS")
                .unwrap_or(defaults.store_timeout_seconds),
            jwt_secret: std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            jwt_audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            audit_mode: parse_env("AUDIT_MODE").unwrap_or(defaults.audit_mode),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: parse_env("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

/// Read and parse an environment variable, warning on unparsable values.
fn parse_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}

/// Load backend secrets from file or environment.
fn load_store_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/store.json",
        "verifiedmeasure/.secrets/store.json",
        "../.secrets/store.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StoreSecrets>(path) {
            tracing::info!(path = %path, "Loaded store secrets from file");
            return (Some(secrets.url), Some(secrets.api_key));
        }
    }

    tracing::debug!("Store secrets file not found, using environment variables");
    (
        std::env::var("STORE_URL").ok(),
        std::env::var("STORE_API_KEY").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            store_backend: StoreBackend::Rest,
            store_url: None,
            store_api_key: None,
            store_timeout_seconds: 30,
            jwt_secret: None,
            jwt_audience: "authenticated".into(),
            audit_mode: AuditMode::BestEffort,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_mode_parses_both_spellings() {
        assert_eq!("strict".parse::<AuditMode>(), Ok(AuditMode::Strict));
        assert_eq!("best_effort".parse::<AuditMode>(), Ok(AuditMode::BestEffort));
        assert_eq!("Best-Effort".parse::<AuditMode>(), Ok(AuditMode::BestEffort));
        assert!("loose".parse::<AuditMode>().is_err());
    }

    #[test]
    fn store_backend_parses() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" REST ".parse::<StoreBackend>(), Ok(StoreBackend::Rest));
        assert!("rocks".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.jwt_audience, "authenticated");
        assert_eq!(config.audit_mode, AuditMode::BestEffort);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }
}
