//! Remediation and issue endpoints

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::services::{ContentType, IssueFix, IssueHandling, RemediationOutcome, ReportedIssue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediateRequest {
    pub content_id: i64,
    pub content_type: ContentType,
}

/// Blacklist the current file(s) and trigger a new search
async fn remediate(
    State(state): State<AppState>,
    Json(request): Json<RemediateRequest>,
) -> Json<RemediationOutcome> {
    info!(
        content_id = request.content_id,
        content_type = %request.content_type,
        "Blacklist and re-search requested"
    );
    Json(
        state
            .issues
            .remediation()
            .remediate(request.content_id, request.content_type)
            .await,
    )
}

/// Mark a Seerr issue as resolved
async fn resolve_issue(
    State(state): State<AppState>,
    Path(issue_id): Path<i64>,
) -> Json<RemediationOutcome> {
    Json(state.issues.seerr().resolve_issue(issue_id).await)
}

/// Fix an issue now, regardless of the auto-fix mode
async fn fix_issue(
    State(state): State<AppState>,
    Json(issue): Json<ReportedIssue>,
) -> Json<IssueFix> {
    Json(state.issues.fix(issue).await)
}

/// Hand a newly reported issue to the auto-fix policy
async fn report_issue(
    State(state): State<AppState>,
    Json(issue): Json<ReportedIssue>,
) -> Json<IssueHandling> {
    Json(state.issues.handle_reported(issue).await)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/remediate", post(remediate))
        .route("/issues", post(report_issue))
        .route("/issues/fix", post(fix_issue))
        .route("/issues/{issue_id}/resolve", post(resolve_issue))
}
