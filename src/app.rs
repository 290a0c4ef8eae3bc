//! Application state and HTTP router construction.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::services::{IssueService, RadarrClient, RemediationService, SeerrClient, SonarrClient};

/// Shared state for HTTP handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub issues: Arc<IssueService>,
}

impl AppState {
    /// Build every upstream client from the configuration
    pub fn from_config(config: Config) -> Self {
        let remediation = RemediationService::new(
            Arc::new(RadarrClient::new(&config.radarr)),
            Arc::new(SonarrClient::new(&config.sonarr)),
        );
        let issues = IssueService::new(
            remediation,
            SeerrClient::new(&config.jellyseerr),
            config.issue_autofix_mode,
        );

        Self {
            config: Arc::new(config),
            issues: Arc::new(issues),
        }
    }
}

/// Build the full Axum router with state applied
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .nest("/api", api::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
