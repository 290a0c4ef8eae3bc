//! Reported media issues and the auto-fix policy
//!
//! When a user reports wrong quality, a missing episode or a broken file, the
//! configured [IssueAutofixMode] decides whether the relay blacklists and
//! re-searches on its own or leaves the issue for an administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::remediation::{ContentType, RemediationOutcome, RemediationService};
use super::seerr::SeerrClient;
use crate::config::IssueAutofixMode;

/// Recorded in `action_taken` after a blacklist-and-re-search run
pub const ACTION_BLACKLIST_RESEARCH: &str = "blacklist_research";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Reported,
    Resolved,
    Failed,
}

/// A problem a user reported against delivered media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedIssue {
    /// Issue ID in Seerr, if the report came from there
    #[serde(default)]
    pub seerr_issue_id: Option<i64>,
    /// `movie` or `tv`
    pub media_type: String,
    pub tmdb_id: i64,
    pub title: String,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub issue_message: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of fixing one issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueFix {
    pub outcome: RemediationOutcome,
    /// Seerr resolution result, when the issue is linked to Seerr and remediation succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seerr: Option<RemediationOutcome>,
    pub issue: ReportedIssue,
}

/// What the auto-fix policy did with a newly reported issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueHandling {
    pub mode: IssueAutofixMode,
    /// Set when the admin should hear about the automatic fix
    pub notify_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<IssueFix>,
    pub issue: ReportedIssue,
}

/// Applies remediation to reported issues and closes them in Seerr
#[derive(Debug, Clone)]
pub struct IssueService {
    remediation: RemediationService,
    seerr: SeerrClient,
    mode: IssueAutofixMode,
}

impl IssueService {
    pub fn new(remediation: RemediationService, seerr: SeerrClient, mode: IssueAutofixMode) -> Self {
        Self {
            remediation,
            seerr,
            mode,
        }
    }

    pub fn mode(&self) -> IssueAutofixMode {
        self.mode
    }

    pub fn remediation(&self) -> &RemediationService {
        &self.remediation
    }

    pub fn seerr(&self) -> &SeerrClient {
        &self.seerr
    }

    /// Blacklist and re-search the issue's media, then resolve it in Seerr
    pub async fn fix(&self, mut issue: ReportedIssue) -> IssueFix {
        let now = Utc::now();
        issue.updated_at = Some(now);

        let Some(content_type) = ContentType::from_media_type(&issue.media_type) else {
            let outcome = RemediationOutcome::failure(
                format!("Unsupported media type '{}'", issue.media_type),
                None,
            );
            issue.status = IssueStatus::Failed;
            issue.error_message = Some(outcome.message.clone());
            return IssueFix {
                outcome,
                seerr: None,
                issue,
            };
        };

        let outcome = self.remediation.remediate(issue.tmdb_id, content_type).await;

        if !outcome.success {
            warn!(
                tmdb_id = issue.tmdb_id,
                title = %issue.title,
                error = %outcome.message,
                "Issue remediation failed"
            );
            issue.status = IssueStatus::Failed;
            issue.error_message = Some(outcome.message.clone());
            return IssueFix {
                outcome,
                seerr: None,
                issue,
            };
        }

        issue.status = IssueStatus::Resolved;
        issue.action_taken = Some(ACTION_BLACKLIST_RESEARCH.to_string());
        issue.resolved_at = Some(now);
        issue.error_message = None;

        let seerr = match issue.seerr_issue_id {
            Some(issue_id) => {
                let resolved = self.seerr.resolve_issue(issue_id).await;
                if !resolved.success {
                    issue.error_message = Some(resolved.message.clone());
                }
                Some(resolved)
            }
            None => None,
        };

        info!(
            tmdb_id = issue.tmdb_id,
            title = %issue.title,
            seerr_issue_id = ?issue.seerr_issue_id,
            "Issue fixed by blacklist and re-search"
        );

        IssueFix {
            outcome,
            seerr,
            issue,
        }
    }

    /// Apply the configured auto-fix policy to a newly reported issue
    pub async fn handle_reported(&self, issue: ReportedIssue) -> IssueHandling {
        if !self.mode.is_automatic() {
            info!(
                tmdb_id = issue.tmdb_id,
                title = %issue.title,
                "Issue left for manual review"
            );
            return IssueHandling {
                mode: self.mode,
                notify_admin: false,
                fix: None,
                issue,
            };
        }

        let fix = self.fix(issue).await;
        IssueHandling {
            mode: self.mode,
            notify_admin: self.mode == IssueAutofixMode::AutoNotify,
            issue: fix.issue.clone(),
            fix: Some(fix),
        }
    }
}
