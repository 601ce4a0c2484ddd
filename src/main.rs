use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use api_shared::HealthService;
use wardboard_core::{open_store, BadgeRefresher, CoreConfig};

/// Main entry point for the Wardboard application
///
/// Serves the REST API and, when the store offers a change feed, keeps the notification badge
/// current in the background.
///
/// # Environment Variables
/// - `WARDBOARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `WARDBOARD_SNAPSHOT`: JSON snapshot to serve instead of the managed backend
/// - `RECORD_STORE_URL`, `RECORD_STORE_KEY`: managed backend endpoint and key
/// - `CLINIC_UTC_OFFSET`: clinic wall-clock offset, e.g. "-03:00" (default: UTC)
/// - `WARDBOARD_DEPARTMENTS`: comma-separated ward list for the bed management table
/// - `WARDBOARD_NOTICE_LIMIT`: notices kept on the board (default: 1)
/// - `API_KEY`: key required in the `x-api-key` header, when set
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, store setup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardboard_run=info".parse()?)
                .add_directive("wardboard_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("WARDBOARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_process_env()?);
    let opened = open_store(&cfg)?;
    tracing::info!("{}", HealthService::check_health().message);

    let mut state = AppState::new(cfg.clone(), opened.records.clone());
    let refresher = match &opened.changes {
        Some(feed) => {
            let badge = BadgeRefresher::new(opened.records.clone(), cfg.clone());
            state = state.with_feed(badge.slot());
            Some(badge.spawn(feed.as_ref()))
        }
        None => {
            tracing::info!("no change feed; notifications are computed per request");
            None
        }
    };

    tracing::info!("++ Starting Wardboard REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    if let Some(handle) = refresher {
        handle.abort();
    }

    Ok(())
}
