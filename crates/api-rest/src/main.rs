//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development when you only want the REST server (with OpenAPI/Swagger UI). The
//! workspace's main `wardboard-run` binary also runs the badge refresher, so the badge there is
//! served from the refreshed feed rather than computed per request.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use wardboard_core::{open_store, CoreConfig};

/// Main entry point for the Wardboard REST API server
///
/// # Environment Variables
/// - `WARDBOARD_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `WARDBOARD_SNAPSHOT`, `RECORD_STORE_URL`, `RECORD_STORE_KEY`: record store backend
/// - `CLINIC_UTC_OFFSET`, `WARDBOARD_DEPARTMENTS`, `WARDBOARD_NOTICE_LIMIT`, `API_KEY`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the snapshot cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("wardboard_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARDBOARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_process_env()?);
    let opened = open_store(&cfg)?;

    tracing::info!("-- Starting Wardboard REST API on {}", addr);

    let app = router(AppState::new(cfg, opened.records));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
