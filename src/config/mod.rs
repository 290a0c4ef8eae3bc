//! Application configuration management

use std::env;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Connection settings for one upstream REST API
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL without the `/api/vN` suffix
    pub base_url: String,

    /// Value sent in the `X-Api-Key` header
    pub api_key: String,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

/// What to do when a user reports a problem with delivered media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAutofixMode {
    /// Administrator reviews every issue
    #[default]
    Manual,
    /// Blacklist and re-search automatically
    Auto,
    /// Same as [IssueAutofixMode::Auto], and flag the admin for a notification
    AutoNotify,
}

impl IssueAutofixMode {
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "manual" => Self::Manual,
            "auto" => Self::Auto,
            "auto_notify" | "auto-notify" => Self::AutoNotify,
            other => {
                warn!(value = %other, "Unknown ISSUE_AUTOFIX_MODE, falling back to manual");
                Self::Manual
            }
        }
    }

    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Auto | Self::AutoNotify)
    }
}

impl fmt::Display for IssueAutofixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueAutofixMode::Manual => write!(f, "manual"),
            IssueAutofixMode::Auto => write!(f, "auto"),
            IssueAutofixMode::AutoNotify => write!(f, "auto_notify"),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the admin API to
    pub host: String,

    /// Admin API port
    pub port: u16,

    /// Jellyseerr / Seerr request manager
    pub jellyseerr: UpstreamConfig,

    /// Sonarr (TV)
    pub sonarr: UpstreamConfig,

    /// Radarr (movies)
    pub radarr: UpstreamConfig,

    /// Policy applied to newly reported issues
    pub issue_autofix_mode: IssueAutofixMode,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid PORT")?,

            jellyseerr: UpstreamConfig::new(
                env::var("JELLYSEERR_URL").context("JELLYSEERR_URL is required")?,
                env::var("JELLYSEERR_API_KEY").context("JELLYSEERR_API_KEY is required")?,
            ),

            sonarr: UpstreamConfig::new(
                env::var("SONARR_URL").context("SONARR_URL is required")?,
                env::var("SONARR_API_KEY").context("SONARR_API_KEY is required")?,
            ),

            radarr: UpstreamConfig::new(
                env::var("RADARR_URL").context("RADARR_URL is required")?,
                env::var("RADARR_API_KEY").context("RADARR_API_KEY is required")?,
            ),

            issue_autofix_mode: env::var("ISSUE_AUTOFIX_MODE")
                .map(|v| IssueAutofixMode::from_str_lossy(&v))
                .unwrap_or_default(),
        })
    }

    /// Socket address string for the admin API listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
