//! Administrative REST API
//!
//! Entry points for administrators (and the auto-fix policy) to trigger
//! blacklist-and-re-search and to close issues in Seerr.

use axum::Router;

use crate::app::AppState;

pub mod health;
pub mod issues;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(issues::router())
}
