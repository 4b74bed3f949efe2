//! VerifiedMeasure Service - HTTP API for lead entitlements and credits
//!
//! This is the main entry point for the verifiedmeasure service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verifiedmeasure_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,verifiedmeasure=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VerifiedMeasure Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        store_backend = ?config.store_backend,
        audit_mode = ?config.audit_mode,
        local_jwt = %config.jwt_secret.is_some(),
        "Service configuration loaded"
    );

    // Build the data-service client once; every handler shares it
    let state = AppState::from_config(config.clone())?;

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
