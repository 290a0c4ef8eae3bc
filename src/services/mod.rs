//! External service integrations and the remediation workflow

pub mod arr;
pub mod issues;
pub mod radarr;
pub mod remediation;
pub mod seerr;
pub mod sonarr;
pub mod upstream;

pub use issues::{IssueFix, IssueHandling, IssueService, IssueStatus, ReportedIssue};
pub use radarr::RadarrClient;
pub use remediation::{
    AcquisitionBackend, AcquisitionResource, ContentType, FileHandle, RemediationOutcome,
    RemediationService,
};
pub use seerr::SeerrClient;
pub use sonarr::SonarrClient;
pub use upstream::{UpstreamClient, UpstreamError};
