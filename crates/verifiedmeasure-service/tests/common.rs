//! Common test utilities for verifiedmeasure integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;

use verifiedmeasure_core::{LeadId, NewLead, UserId};
use verifiedmeasure_service::{create_router, AppState, AuditMode, ServiceConfig, StoreBackend};
use verifiedmeasure_store::MemoryStore;

/// Bearer token of the regular test user.
pub const USER_TOKEN: &str = "user-token";

/// Bearer token of the admin test user.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The in-memory backend behind the server, for seeding and inspection.
    pub store: Arc<MemoryStore>,
    /// A regular user.
    pub user_id: UserId,
    /// A user that passes the admin predicate.
    pub admin_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    /// Create a harness whose audit writes fail under the given mode.
    pub async fn with_audit_mode(audit_mode: AuditMode) -> Self {
        Self::with_config(ServiceConfig {
            audit_mode,
            ..ServiceConfig::default()
        })
        .await
    }

    /// Create a harness with custom configuration.
    pub async fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());

        let user_id = UserId::generate();
        let admin_id = UserId::generate();
        store.register_session(USER_TOKEN, user_id).await;
        store.register_session(ADMIN_TOKEN, admin_id).await;
        store.add_admin(admin_id).await;

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            store_backend: StoreBackend::Memory,
            ..config
        };

        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            user_id,
            admin_id,
        }
    }

    /// Seed `n` leads and return their ids as strings.
    pub async fn seed_leads(&self, n: usize) -> Vec<String> {
        let leads: Vec<NewLead> = (0..n)
            .map(|i| NewLead {
                company: format!("Company {i}"),
                website: Some(format!("company{i}.io")),
                email: Some(format!("contact@company{i}.io")),
                phone: Some(format!("+1 555 010 {i:04}")),
                meta: serde_json::Map::new(),
            })
            .collect();
        self.store
            .seed_leads(&leads)
            .await
            .iter()
            .map(LeadId::to_string)
            .collect()
    }

    /// Give the regular user a starting balance.
    pub async fn fund_user(&self, amount: i64) {
        self.store.seed_credit(self.user_id, amount).await;
    }

    /// Current balance of the regular user.
    pub async fn user_balance(&self) -> i64 {
        self.store.balance(&self.user_id).await
    }
}

/// `Authorization` header for a bearer token.
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value"),
    )
}
