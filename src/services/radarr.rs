//! Radarr v3 API client (movies)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::arr::{CommandResponse, IMPORT_EXCLUSION, QualityProfile, SearchCommand};
use super::remediation::{AcquisitionBackend, AcquisitionResource, ContentType, FileHandle};
use super::upstream::{UpstreamClient, UpstreamError};
use crate::config::UpstreamConfig;

/// Movie as returned by `GET /movie`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub movie_file_id: Option<i64>,
    #[serde(default)]
    pub movie_file: Option<RadarrMovieFile>,
    #[serde(default)]
    pub quality_profile_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovieFile {
    pub id: i64,
    #[serde(default)]
    pub relative_path: Option<String>,
}

impl RadarrMovie {
    /// The delivered file, if any.
    ///
    /// Radarr reports `movieFileId = 0` for movies without a file, so zero
    /// falls through to the nested `movieFile` object.
    pub fn file_handle(&self) -> Option<FileHandle> {
        let nested = self.movie_file.as_ref().filter(|f| f.id > 0);

        let id = self
            .movie_file_id
            .filter(|id| *id > 0)
            .or_else(|| nested.map(|f| f.id))?;

        Some(FileHandle {
            id,
            season_number: None,
            episode_numbers: Vec::new(),
            relative_path: nested.and_then(|f| f.relative_path.clone()),
        })
    }

    fn into_resource(self) -> AcquisitionResource {
        let file = self.file_handle();
        AcquisitionResource::Movie {
            id: self.id,
            content_id: self.tmdb_id.unwrap_or_default(),
            title: self.title,
            file,
        }
    }
}

/// Radarr API client
#[derive(Debug, Clone)]
pub struct RadarrClient {
    api: UpstreamClient,
}

impl RadarrClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            api: UpstreamClient::new("Radarr", config, "/api/v3"),
        }
    }

    /// Get movie details by Radarr ID
    pub async fn get_movie(&self, movie_id: i64) -> Option<RadarrMovie> {
        match self.api.get(&format!("/movie/{}", movie_id)).await {
            Ok(movie) => Some(movie),
            Err(e) => {
                error!(movie_id = movie_id, error = %e, "Failed to fetch movie from Radarr");
                None
            }
        }
    }

    /// Get all movies
    pub async fn get_movies(&self) -> Vec<RadarrMovie> {
        self.list_movies().await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to fetch all movies from Radarr");
            Vec::new()
        })
    }

    /// Find a movie by TMDB ID, treating lookup failures as not found
    pub async fn get_movie_by_tmdb(&self, tmdb_id: i64) -> Option<RadarrMovie> {
        self.find_movie_by_tmdb(tmdb_id).await.unwrap_or_else(|e| {
            error!(tmdb_id = tmdb_id, error = %e, "Failed to find movie by TMDB ID");
            None
        })
    }

    /// Find a movie by TMDB ID. First match in the listing wins.
    pub async fn find_movie_by_tmdb(
        &self,
        tmdb_id: i64,
    ) -> Result<Option<RadarrMovie>, UpstreamError> {
        let movies = self.list_movies().await?;
        debug!(count = movies.len(), tmdb_id = tmdb_id, "Scanning Radarr movies");
        Ok(movies.into_iter().find(|m| m.tmdb_id == Some(tmdb_id)))
    }

    pub async fn get_quality_profiles(&self) -> Vec<QualityProfile> {
        self.api.get("/qualityProfile").await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to fetch quality profiles from Radarr");
            Vec::new()
        })
    }

    /// Delete a movie file and exclude it from future imports
    pub async fn delete_movie_file(&self, file_id: i64) -> Result<(), UpstreamError> {
        self.api
            .delete(&format!("/moviefile/{}", file_id), IMPORT_EXCLUSION)
            .await
    }

    /// Queue a `MoviesSearch` command for one movie
    pub async fn search_movie(&self, movie_id: i64) -> Result<CommandResponse, UpstreamError> {
        let command: CommandResponse = self
            .api
            .post("/command", &SearchCommand::movie(movie_id))
            .await?;
        info!(movie_id = movie_id, command_id = ?command.id, "Queued Radarr movie search");
        Ok(command)
    }

    async fn list_movies(&self) -> Result<Vec<RadarrMovie>, UpstreamError> {
        self.api.get("/movie").await
    }
}

#[async_trait]
impl AcquisitionBackend for RadarrClient {
    fn system_name(&self) -> &'static str {
        self.api.name()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Movie
    }

    async fn find_by_content_id(
        &self,
        content_id: i64,
    ) -> Result<Option<AcquisitionResource>, UpstreamError> {
        Ok(self
            .find_movie_by_tmdb(content_id)
            .await?
            .map(RadarrMovie::into_resource))
    }

    async fn file_inventory(&self, resource: &AcquisitionResource) -> Vec<FileHandle> {
        match resource {
            AcquisitionResource::Movie { file, .. } => file.iter().cloned().collect(),
            AcquisitionResource::Series { .. } => Vec::new(),
        }
    }

    async fn blacklist_file(&self, file: &FileHandle) -> Result<(), UpstreamError> {
        self.delete_movie_file(file.id).await
    }

    async fn trigger_search(&self, resource: &AcquisitionResource) -> Result<(), UpstreamError> {
        self.search_movie(resource.id()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn movie_json(value: serde_json::Value) -> RadarrMovie {
        serde_json::from_value(value).unwrap()
    }

    fn client_for(server: &MockServer) -> RadarrClient {
        RadarrClient::new(&UpstreamConfig::new(server.base_url(), "radarr-key"))
    }

    #[test]
    fn test_file_handle_prefers_movie_file_id() {
        let movie = movie_json(json!({
            "id": 1, "title": "Alien", "tmdbId": 348,
            "movieFileId": 10, "movieFile": { "id": 11 }
        }));
        assert_eq!(movie.file_handle().map(|f| f.id), Some(10));
    }

    #[test]
    fn test_file_handle_falls_back_to_nested_file() {
        let movie = movie_json(json!({
            "id": 1, "title": "Alien", "tmdbId": 348,
            "movieFileId": 0, "hasFile": true,
            "movieFile": { "id": 11, "relativePath": "Alien (1979).mkv" }
        }));
        let file = movie.file_handle().unwrap();
        assert_eq!(file.id, 11);
        assert_eq!(file.relative_path.as_deref(), Some("Alien (1979).mkv"));
    }

    #[test]
    fn test_file_handle_absent() {
        let movie = movie_json(json!({ "id": 1, "title": "Alien", "movieFileId": 0 }));
        assert!(movie.file_handle().is_none());
    }

    #[tokio::test]
    async fn test_find_by_tmdb_first_match_wins() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/movie");
            then.status(200).json_body(json!([
                { "id": 1, "title": "Other", "tmdbId": 5 },
                { "id": 2, "title": "Alien", "tmdbId": 348 },
                { "id": 3, "title": "Alien (dup)", "tmdbId": 348 }
            ]));
        });

        let movie = client_for(&server).get_movie_by_tmdb(348).await.unwrap();
        assert_eq!(movie.id, 2);
    }

    #[tokio::test]
    async fn test_listing_failure_yields_safe_defaults() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/movie");
            then.status(503);
        });

        let client = client_for(&server);
        assert!(client.get_movie_by_tmdb(348).await.is_none());
        assert!(client.get_movies().await.is_empty());
        assert!(client.find_movie_by_tmdb(348).await.is_err());
    }

    #[tokio::test]
    async fn test_get_movie_not_found_is_none() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/movie/77");
            then.status(404);
        });

        assert!(client_for(&server).get_movie(77).await.is_none());
    }

    #[tokio::test]
    async fn test_quality_profiles() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/qualityProfile")
                .header("X-Api-Key", "radarr-key");
            then.status(200)
                .json_body(json!([{ "id": 4, "name": "HD-1080p", "upgradeAllowed": true }]));
        });

        let profiles = client_for(&server).get_quality_profiles().await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "HD-1080p");
    }

    #[tokio::test]
    async fn test_delete_sends_import_exclusion() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/api/v3/moviefile/42")
                .query_param("addImportExclusion", "true");
            then.status(200);
        });

        client_for(&server).delete_movie_file(42).await.unwrap();
        mock.assert();
    }
}
