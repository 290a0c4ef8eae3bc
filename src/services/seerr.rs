//! Jellyseerr / Seerr client (issue management)

use tracing::{error, info};

use super::remediation::RemediationOutcome;
use super::upstream::UpstreamClient;
use crate::config::UpstreamConfig;

/// Seerr API client
#[derive(Debug, Clone)]
pub struct SeerrClient {
    api: UpstreamClient,
}

impl SeerrClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            api: UpstreamClient::new("Seerr", config, "/api/v1"),
        }
    }

    /// Mark an issue as resolved in Seerr. Never fails; the outcome carries the error.
    pub async fn resolve_issue(&self, issue_id: i64) -> RemediationOutcome {
        match self
            .api
            .post_empty(&format!("/issue/{}/resolved", issue_id))
            .await
        {
            Ok(()) => {
                info!(issue_id = issue_id, "Resolved issue in Seerr");
                RemediationOutcome::success(format!("Issue #{} resolved in Seerr", issue_id), None)
            }
            Err(e) => {
                error!(issue_id = issue_id, error = %e, "Failed to resolve issue in Seerr");
                RemediationOutcome::failure(
                    format!("Failed to resolve issue #{} in Seerr: {}", issue_id, e),
                    None,
                )
            }
        }
    }
}
