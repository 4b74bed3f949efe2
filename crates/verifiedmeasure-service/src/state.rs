//! Application state.

use std::sync::Arc;
use std::time::Duration;

use verifiedmeasure_store::{MemoryStore, RestStore, Store, StoreError};

use crate::config::{ServiceConfig, StoreBackend};
use crate::workflows::ClaimLocks;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The data-service backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Per-user claim serialization.
    pub claim_locks: ClaimLocks,
}

impl AppState {
    /// Create a new application state around an existing store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        if config.jwt_secret.is_some() {
            tracing::info!(audience = %config.jwt_audience, "Local JWT verification enabled");
        } else {
            tracing::debug!("JWT_SECRET not set - tokens are resolved through the auth provider");
        }

        Self {
            store,
            config,
            claim_locks: ClaimLocks::default(),
        }
    }

    /// Build the configured backend and wrap it in application state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` when the REST backend is selected
    /// without a URL and key, or when its HTTP client cannot be built.
    pub fn from_config(config: ServiceConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::Rest => {
                let (Some(url), Some(key)) = (&config.store_url, &config.store_api_key) else {
                    return Err(StoreError::Configuration(
                        "STORE_URL and STORE_API_KEY are required for the rest backend".into(),
                    ));
                };
                tracing::info!(store_url = %url, "Using REST store backend");
                Arc::new(RestStore::new(
                    url,
                    key,
                    Duration::from_secs(config.store_timeout_seconds),
                )?)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store backend - data is lost on exit");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(store, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_backend_requires_credentials() {
        let config = ServiceConfig::default();
        assert!(matches!(
            AppState::from_config(config),
            Err(StoreError::Configuration(_))
        ));
    }

    #[test]
    fn memory_backend_needs_nothing() {
        let config = ServiceConfig {
            store_backend: StoreBackend::Memory,
            ..ServiceConfig::default()
        };
        assert!(AppState::from_config(config).is_ok());
    }
}
