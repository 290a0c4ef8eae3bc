//! seerr-relay - notification and remediation relay for Seerr, Sonarr and Radarr
//!
//! Exposes the administrative API at /api.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seerr_relay::app::{AppState, build_app};
use seerr_relay::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seerr_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting seerr-relay");

    let config = Config::from_env()?;
    tracing::info!(
        radarr = %config.radarr.base_url,
        sonarr = %config.sonarr.base_url,
        jellyseerr = %config.jellyseerr.base_url,
        issue_autofix_mode = %config.issue_autofix_mode,
        "Configuration loaded"
    );

    let addr = config.bind_address();
    let app = build_app(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
