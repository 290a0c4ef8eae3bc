//! Blacklist-and-re-search remediation
//!
//! Given a reported problem with delivered media, this service:
//! - Locates the movie/series in Radarr/Sonarr by its TMDB ID
//! - Resolves the file(s) currently delivered for it
//! - Deletes each file with an import exclusion so the same release is not re-imported
//! - Triggers a fresh search for the resource
//!
//! Every run produces a complete [RemediationOutcome]; upstream failures are
//! logged and folded into the outcome instead of being returned to the caller.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tracing::{error, info, warn};

use super::upstream::UpstreamError;

/// Which acquisition system a piece of content lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    #[serde(alias = "tv", alias = "show")]
    Series,
}

impl ContentType {
    /// Parse the media type strings used by Seerr (`movie`, `tv`)
    pub fn from_media_type(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "movie" => Some(ContentType::Movie),
            "tv" | "series" | "show" => Some(ContentType::Series),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Movie => write!(f, "Movie"),
            ContentType::Series => write!(f, "Series"),
        }
    }
}

/// A file the acquisition system currently considers delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub id: i64,
    /// Season the file belongs to (series only)
    pub season_number: Option<i32>,
    /// Episodes of that season stored in the file (series only)
    #[serde(default)]
    pub episode_numbers: Vec<i32>,
    /// Path relative to the series/movie folder, for log output
    pub relative_path: Option<String>,
}

impl FileHandle {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            season_number: None,
            episode_numbers: Vec::new(),
            relative_path: None,
        }
    }
}

/// Movie or series as seen by Radarr/Sonarr
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionResource {
    Movie {
        id: i64,
        content_id: i64,
        title: String,
        file: Option<FileHandle>,
    },
    Series {
        id: i64,
        content_id: i64,
        title: String,
    },
}

impl AcquisitionResource {
    pub fn id(&self) -> i64 {
        match self {
            AcquisitionResource::Movie { id, .. } | AcquisitionResource::Series { id, .. } => *id,
        }
    }

    pub fn content_id(&self) -> i64 {
        match self {
            AcquisitionResource::Movie { content_id, .. }
            | AcquisitionResource::Series { content_id, .. } => *content_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            AcquisitionResource::Movie { title, .. }
            | AcquisitionResource::Series { title, .. } => title,
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            AcquisitionResource::Movie { .. } => ContentType::Movie,
            AcquisitionResource::Series { .. } => ContentType::Series,
        }
    }
}

/// Operations the remediation workflow needs from an acquisition system.
///
/// Implemented by the Radarr and Sonarr clients.
#[async_trait]
pub trait AcquisitionBackend: Send + Sync {
    /// Display name used in messages ("Radarr", "Sonarr")
    fn system_name(&self) -> &'static str;

    fn content_type(&self) -> ContentType;

    /// Scan the full listing for a resource with the given TMDB ID.
    /// `Ok(None)` means the listing was fetched and nothing matched.
    async fn find_by_content_id(
        &self,
        content_id: i64,
    ) -> Result<Option<AcquisitionResource>, UpstreamError>;

    /// Files currently delivered for the resource. Empty means nothing to remove.
    async fn file_inventory(&self, resource: &AcquisitionResource) -> Vec<FileHandle>;

    /// Delete a file and add an import exclusion for it
    async fn blacklist_file(&self, file: &FileHandle) -> Result<(), UpstreamError>;

    /// Ask the acquisition system to search for new releases
    async fn trigger_search(&self, resource: &AcquisitionResource) -> Result<(), UpstreamError>;
}

/// Result of one remediation run, safe to show to an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl RemediationOutcome {
    pub fn success(message: impl Into<String>, details: Option<JsonValue>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Option<JsonValue>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details,
        }
    }
}

/// Why a run did not complete
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("{content_type} with TMDB ID {content_id} not found in {system}")]
    NotFound {
        content_type: ContentType,
        content_id: i64,
        system: &'static str,
    },

    #[error("Failed to look up {content_type} with TMDB ID {content_id} in {system}: {source}")]
    LookupFailed {
        content_type: ContentType,
        content_id: i64,
        system: &'static str,
        #[source]
        source: UpstreamError,
    },

    #[error("Error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl RemediationError {
    /// Stable machine-readable reason for the outcome details
    pub fn reason(&self) -> &'static str {
        match self {
            RemediationError::NotFound { .. } => "not_found",
            RemediationError::LookupFailed { .. } => "lookup_failed",
            RemediationError::Upstream(_) => "upstream_error",
        }
    }
}

impl From<RemediationError> for RemediationOutcome {
    fn from(err: RemediationError) -> Self {
        let reason = err.reason();
        RemediationOutcome::failure(err.to_string(), Some(json!({ "reason": reason })))
    }
}

/// Tally of the removal step
#[derive(Debug, Default)]
struct RemovalReport {
    removed: Vec<i64>,
    failed: Vec<i64>,
}

/// Drives blacklist-and-re-search against Radarr and Sonarr
#[derive(Clone)]
pub struct RemediationService {
    movies: Arc<dyn AcquisitionBackend>,
    series: Arc<dyn AcquisitionBackend>,
}

impl RemediationService {
    pub fn new(movies: Arc<dyn AcquisitionBackend>, series: Arc<dyn AcquisitionBackend>) -> Self {
        Self { movies, series }
    }

    fn backend(&self, content_type: ContentType) -> &dyn AcquisitionBackend {
        match content_type {
            ContentType::Movie => self.movies.as_ref(),
            ContentType::Series => self.series.as_ref(),
        }
    }

    /// Blacklist the delivered file(s) for a piece of content and trigger a new search.
    ///
    /// Never fails: every path yields a complete [RemediationOutcome].
    pub async fn remediate(&self, content_id: i64, content_type: ContentType) -> RemediationOutcome {
        let backend = self.backend(content_type);

        match blacklist_and_research(backend, content_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    system = backend.system_name(),
                    content_type = %content_type,
                    content_id = content_id,
                    error = %e,
                    "Failed to blacklist and re-search"
                );
                e.into()
            }
        }
    }
}

impl fmt::Debug for RemediationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemediationService")
            .field("movies", &self.movies.system_name())
            .field("series", &self.series.system_name())
            .finish()
    }
}

/// Locate, inventory, remove, search. Search always runs once the resource is found.
pub async fn blacklist_and_research(
    backend: &dyn AcquisitionBackend,
    content_id: i64,
) -> Result<RemediationOutcome, RemediationError> {
    let content_type = backend.content_type();
    let system = backend.system_name();

    let resource = backend
        .find_by_content_id(content_id)
        .await
        .map_err(|source| RemediationError::LookupFailed {
            content_type,
            content_id,
            system,
            source,
        })?
        .ok_or(RemediationError::NotFound {
            content_type,
            content_id,
            system,
        })?;

    let files = backend.file_inventory(&resource).await;

    if files.is_empty() {
        info!(
            system = system,
            resource_id = resource.id(),
            title = %resource.title(),
            "No file found, triggering search directly"
        );
        backend.trigger_search(&resource).await?;

        return Ok(RemediationOutcome::success(
            format!(
                "No existing file to blacklist. Triggered new search for {}",
                resource.title()
            ),
            Some(details(&resource, &RemovalReport::default())),
        ));
    }

    let report = remove_files(backend, &resource, &files).await;

    info!(
        system = system,
        resource_id = resource.id(),
        title = %resource.title(),
        removed = report.removed.len(),
        failed = report.failed.len(),
        "Triggering new search"
    );
    backend.trigger_search(&resource).await?;

    Ok(RemediationOutcome::success(
        success_message(&resource, &report),
        Some(details(&resource, &report)),
    ))
}

async fn remove_files(
    backend: &dyn AcquisitionBackend,
    resource: &AcquisitionResource,
    files: &[FileHandle],
) -> RemovalReport {
    let mut report = RemovalReport::default();

    for file in files {
        info!(
            system = backend.system_name(),
            file_id = file.id,
            season = ?file.season_number,
            episodes = ?file.episode_numbers,
            path = ?file.relative_path,
            title = %resource.title(),
            "Blacklisting file"
        );
        match backend.blacklist_file(file).await {
            Ok(()) => report.removed.push(file.id),
            Err(e) => {
                warn!(
                    system = backend.system_name(),
                    file_id = file.id,
                    error = %e,
                    "Failed to blacklist file, skipping"
                );
                report.failed.push(file.id);
            }
        }
    }

    report
}

fn success_message(resource: &AcquisitionResource, report: &RemovalReport) -> String {
    let mut message = match (resource, report.removed.len(), report.failed.len()) {
        (AcquisitionResource::Movie { .. }, 1, 0) => format!(
            "Blacklisted current file and triggered re-search for {}",
            resource.title()
        ),
        (_, removed, _) => format!(
            "Blacklisted {} file(s) and triggered re-search for {}",
            removed,
            resource.title()
        ),
    };

    if !report.failed.is_empty() {
        message.push_str(&format!(
            " ({} file(s) could not be blacklisted)",
            report.failed.len()
        ));
    }

    message
}

fn details(resource: &AcquisitionResource, report: &RemovalReport) -> JsonValue {
    match resource {
        AcquisitionResource::Movie { id, .. } => {
            let mut details = json!({ "movie_id": id });
            if let Some(file_id) = report.removed.first() {
                details["blacklisted_file_id"] = json!(file_id);
            }
            if !report.failed.is_empty() {
                details["failed_file_ids"] = json!(report.failed);
            }
            details
        }
        AcquisitionResource::Series { id, .. } => json!({
            "series_id": id,
            "blacklisted_files": report.removed.len(),
            "blacklisted_file_ids": report.removed,
            "failed_file_ids": report.failed,
        }),
    }
}
