//! Models shared by the Radarr and Sonarr v3 APIs

use serde::{Deserialize, Serialize};

/// Search command posted to `/command`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum SearchCommand {
    MoviesSearch {
        #[serde(rename = "movieIds")]
        movie_ids: Vec<i64>,
    },
    SeriesSearch {
        #[serde(rename = "seriesId")]
        series_id: i64,
    },
}

impl SearchCommand {
    pub fn movie(movie_id: i64) -> Self {
        SearchCommand::MoviesSearch {
            movie_ids: vec![movie_id],
        }
    }

    pub fn series(series_id: i64) -> Self {
        SearchCommand::SeriesSearch { series_id }
    }
}

/// Command resource returned after queueing a command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Quality profile (both apps share the shape we care about)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub upgrade_allowed: Option<bool>,
    #[serde(default)]
    pub cutoff: Option<i64>,
}

/// Query used on every file deletion so the same release is never re-imported
pub const IMPORT_EXCLUSION: &[(&str, &str)] = &[("addImportExclusion", "true")];
