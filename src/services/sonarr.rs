//! Sonarr v3 API client (TV series)

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::arr::{CommandResponse, IMPORT_EXCLUSION, QualityProfile, SearchCommand};
use super::remediation::{AcquisitionBackend, AcquisitionResource, ContentType, FileHandle};
use super::upstream::{UpstreamClient, UpstreamError};
use crate::config::UpstreamConfig;

/// Days ahead the calendar covers when no end date is given
const CALENDAR_DEFAULT_DAYS: i64 = 30;

/// Queue states that mean an episode is still on its way
const ACTIVE_QUEUE_STATES: [&str; 3] = ["downloading", "queued", "importpending"];

/// Queue records omit the nested episode and series unless asked for
const QUEUE_INCLUDES: &[(&str, &str)] = &[("includeEpisode", "true"), ("includeSeries", "true")];

/// Series as returned by `GET /series`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeries {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub quality_profile_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisode {
    pub id: i64,
    #[serde(default)]
    pub series_id: Option<i64>,
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub air_date_utc: Option<String>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub episode_file_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisodeFile {
    pub id: i64,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub season_number: Option<i32>,
    #[serde(default)]
    pub relative_path: Option<String>,
}

impl From<SonarrEpisodeFile> for FileHandle {
    fn from(file: SonarrEpisodeFile) -> Self {
        FileHandle {
            id: file.id,
            season_number: file.season_number,
            episode_numbers: Vec::new(),
            relative_path: file.relative_path,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct QueuePage {
    #[serde(default)]
    records: Vec<QueueRecord>,
}

/// One entry of `GET /queue`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub series: Option<QueueSeriesRef>,
    #[serde(default)]
    pub episode: Option<SonarrEpisode>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSeriesRef {
    pub id: i64,
}

impl QueueRecord {
    fn belongs_to(&self, series_id: i64) -> bool {
        self.series.as_ref().map(|s| s.id).or(self.series_id) == Some(series_id)
    }

    fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| ACTIVE_QUEUE_STATES.contains(&s.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// Episode of a series that is downloading or waiting to be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEpisode {
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub title: Option<String>,
    pub status: String,
}

/// Sonarr API client
#[derive(Debug, Clone)]
pub struct SonarrClient {
    api: UpstreamClient,
}

impl SonarrClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            api: UpstreamClient::new("Sonarr", config, "/api/v3"),
        }
    }

    /// Get series details by Sonarr ID
    pub async fn get_series(&self, series_id: i64) -> Option<SonarrSeries> {
        match self.api.get(&format!("/series/{}", series_id)).await {
            Ok(series) => Some(series),
            Err(e) => {
                error!(series_id = series_id, error = %e, "Failed to fetch series from Sonarr");
                None
            }
        }
    }

    pub async fn get_episode(&self, episode_id: i64) -> Option<SonarrEpisode> {
        match self.api.get(&format!("/episode/{}", episode_id)).await {
            Ok(episode) => Some(episode),
            Err(e) => {
                error!(episode_id = episode_id, error = %e, "Failed to fetch episode from Sonarr");
                None
            }
        }
    }

    /// Get all series. `None` when Sonarr could not be reached.
    pub async fn get_all_series(&self) -> Option<Vec<SonarrSeries>> {
        match self.list_series().await {
            Ok(series) => Some(series),
            Err(e) => {
                error!(error = %e, "Failed to fetch all series from Sonarr");
                None
            }
        }
    }

    /// Find a series by TMDB ID, treating lookup failures as not found
    pub async fn get_series_by_tmdb(&self, tmdb_id: i64) -> Option<SonarrSeries> {
        self.find_series_by_tmdb(tmdb_id).await.unwrap_or_else(|e| {
            error!(tmdb_id = tmdb_id, error = %e, "Failed to find series by TMDB ID");
            None
        })
    }

    /// Find a series by TMDB ID. First match in the listing wins.
    pub async fn find_series_by_tmdb(
        &self,
        tmdb_id: i64,
    ) -> Result<Option<SonarrSeries>, UpstreamError> {
        let series = self.list_series().await?;
        debug!(count = series.len(), tmdb_id = tmdb_id, "Scanning Sonarr series");
        Ok(series.into_iter().find(|s| s.tmdb_id == Some(tmdb_id)))
    }

    pub async fn get_episodes_by_series(&self, series_id: i64) -> Option<Vec<SonarrEpisode>> {
        match self
            .api
            .get_with_query("/episode", &[("seriesId", series_id)])
            .await
        {
            Ok(episodes) => Some(episodes),
            Err(e) => {
                error!(series_id = series_id, error = %e, "Failed to fetch episodes for series");
                None
            }
        }
    }

    /// Episode files currently on disk for a series
    pub async fn get_episode_files(
        &self,
        series_id: i64,
    ) -> Result<Vec<SonarrEpisodeFile>, UpstreamError> {
        self.api
            .get_with_query("/episodefile", &[("seriesId", series_id)])
            .await
    }

    /// Current download/import queue. Empty when Sonarr could not be reached.
    pub async fn get_queue(&self) -> Vec<QueueRecord> {
        match self
            .api
            .get_with_query::<QueuePage, _>("/queue", QUEUE_INCLUDES)
            .await
        {
            Ok(page) => page.records,
            Err(e) => {
                error!(error = %e, "Failed to fetch Sonarr queue");
                Vec::new()
            }
        }
    }

    /// Episodes of one series that are downloading, queued or pending import
    pub async fn get_series_episodes_in_queue(&self, series_id: i64) -> Vec<QueuedEpisode> {
        let queued: Vec<QueuedEpisode> = self
            .get_queue()
            .await
            .into_iter()
            .filter(|item| item.belongs_to(series_id) && item.is_active())
            .map(|item| QueuedEpisode {
                season: item.episode.as_ref().map(|e| e.season_number),
                episode: item.episode.as_ref().map(|e| e.episode_number),
                title: item.episode.and_then(|e| e.title),
                status: item.status.unwrap_or_default(),
            })
            .collect();

        info!(series_id = series_id, count = queued.len(), "Found episodes in queue for series");
        queued
    }

    /// Upcoming episodes between `start` and `end` (today and today + 30 days by default)
    pub async fn get_calendar(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<Vec<SonarrEpisode>> {
        let (start, end) = calendar_window(start, end, Utc::now().date_naive());
        let query = [
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
        ];

        match self.api.get_with_query("/calendar", &query[..]).await {
            Ok(episodes) => Some(episodes),
            Err(e) => {
                error!(error = %e, "Failed to fetch Sonarr calendar");
                None
            }
        }
    }

    pub async fn get_quality_profiles(&self) -> Vec<QualityProfile> {
        self.api.get("/qualityProfile").await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to fetch quality profiles from Sonarr");
            Vec::new()
        })
    }

    /// Delete an episode file and exclude it from future imports
    pub async fn delete_episode_file(&self, file_id: i64) -> Result<(), UpstreamError> {
        self.api
            .delete(&format!("/episodefile/{}", file_id), IMPORT_EXCLUSION)
            .await
    }

    /// Queue a `SeriesSearch` command
    pub async fn search_series(&self, series_id: i64) -> Result<CommandResponse, UpstreamError> {
        let command: CommandResponse = self
            .api
            .post("/command", &SearchCommand::series(series_id))
            .await?;
        info!(series_id = series_id, command_id = ?command.id, "Queued Sonarr series search");
        Ok(command)
    }

    async fn list_series(&self) -> Result<Vec<SonarrSeries>, UpstreamError> {
        self.api.get("/series").await
    }
}

/// Tag each episode file with the episode numbers Sonarr maps onto it
fn attach_episode_numbers(files: &mut [FileHandle], episodes: &[SonarrEpisode]) {
    for file in files.iter_mut() {
        let mut numbers: Vec<i32> = episodes
            .iter()
            .filter(|ep| ep.episode_file_id == Some(file.id))
            .map(|ep| ep.episode_number)
            .collect();
        numbers.sort_unstable();
        file.episode_numbers = numbers;
    }
}

fn calendar_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    (
        start.unwrap_or(today),
        end.unwrap_or(today + Duration::days(CALENDAR_DEFAULT_DAYS)),
    )
}

#[async_trait]
impl AcquisitionBackend for SonarrClient {
    fn system_name(&self) -> &'static str {
        self.api.name()
    }

    fn content_type(&self) -> ContentType {
        ContentType::Series
    }

    async fn find_by_content_id(
        &self,
        content_id: i64,
    ) -> Result<Option<AcquisitionResource>, UpstreamError> {
        Ok(self
            .find_series_by_tmdb(content_id)
            .await?
            .map(|series| AcquisitionResource::Series {
                id: series.id,
                content_id,
                title: series.title,
            }))
    }

    async fn file_inventory(&self, resource: &AcquisitionResource) -> Vec<FileHandle> {
        let mut files: Vec<FileHandle> = match self.get_episode_files(resource.id()).await {
            Ok(files) => files.into_iter().map(FileHandle::from).collect(),
            Err(e) => {
                warn!(
                    series_id = resource.id(),
                    error = %e,
                    "Failed to fetch episode files, continuing without removal"
                );
                return Vec::new();
            }
        };

        // Removal goes ahead without episode numbers when the episode listing fails
        if !files.is_empty() {
            if let Some(episodes) = self.get_episodes_by_series(resource.id()).await {
                attach_episode_numbers(&mut files, &episodes);
            }
        }
        files
    }

    async fn blacklist_file(&self, file: &FileHandle) -> Result<(), UpstreamError> {
        self.delete_episode_file(file.id).await
    }

    async fn trigger_search(&self, resource: &AcquisitionResource) -> Result<(), UpstreamError> {
        self.search_series(resource.id()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client_for(server: &MockServer) -> SonarrClient {
        SonarrClient::new(&UpstreamConfig::new(server.base_url(), "sonarr-key"))
    }

    #[test]
    fn test_calendar_window_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let (start, end) = calendar_window(None, None, today);
        assert_eq!(start, today);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 9).unwrap());

        let explicit = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(calendar_window(Some(explicit), Some(explicit), today), (explicit, explicit));
    }

    #[tokio::test]
    async fn test_calendar_sends_date_range() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/calendar")
                .query_param("start", "2026-03-01")
                .query_param("end", "2026-03-08");
            then.status(200).json_body(json!([
                { "id": 5, "seriesId": 1, "seasonNumber": 2, "episodeNumber": 3, "title": "Pilot" }
            ]));
        });

        let episodes = client_for(&server)
            .get_calendar(
                NaiveDate::from_ymd_opt(2026, 3, 1),
                NaiveDate::from_ymd_opt(2026, 3, 8),
            )
            .await
            .unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].episode_number, 3);
        mock.assert();
    }

    #[tokio::test]
    async fn test_series_queue_filters_by_series_and_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/queue")
                .query_param("includeEpisode", "true")
                .query_param("includeSeries", "true");
            then.status(200).json_body(json!({
                "records": [
                    {
                        "series": { "id": 7 }, "status": "downloading",
                        "episode": { "id": 1, "seasonNumber": 1, "episodeNumber": 4, "title": "Four" }
                    },
                    {
                        "seriesId": 7, "status": "importPending",
                        "episode": { "id": 2, "seasonNumber": 1, "episodeNumber": 5, "title": "Five" }
                    },
                    {
                        "series": { "id": 7 }, "status": "completed",
                        "episode": { "id": 3, "seasonNumber": 1, "episodeNumber": 6 }
                    },
                    {
                        "series": { "id": 8 }, "status": "queued",
                        "episode": { "id": 4, "seasonNumber": 1, "episodeNumber": 1 }
                    }
                ]
            }));
        });

        let queued = client_for(&server).get_series_episodes_in_queue(7).await;
        assert_eq!(
            queued,
            vec![
                QueuedEpisode {
                    season: Some(1),
                    episode: Some(4),
                    title: Some("Four".to_string()),
                    status: "downloading".to_string(),
                },
                QueuedEpisode {
                    season: Some(1),
                    episode: Some(5),
                    title: Some("Five".to_string()),
                    status: "importPending".to_string(),
                },
            ]
        );
        mock.assert();
    }

    #[tokio::test]
    async fn test_get_series_by_id() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/series/3")
                .header("X-Api-Key", "sonarr-key");
            then.status(200)
                .json_body(json!({ "id": 3, "title": "Game of Thrones", "tmdbId": 1399 }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/series/4");
            then.status(404);
        });

        let client = client_for(&server);
        let series = client.get_series(3).await.unwrap();
        assert_eq!(series.title, "Game of Thrones");
        assert_eq!(series.tmdb_id, Some(1399));
        assert!(client.get_series(4).await.is_none());
    }

    #[tokio::test]
    async fn test_get_episode_by_id() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/episode/21");
            then.status(200).json_body(json!({
                "id": 21, "seriesId": 3, "seasonNumber": 2, "episodeNumber": 7, "title": "The Climb"
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/episode/22");
            then.status(404);
        });

        let client = client_for(&server);
        let episode = client.get_episode(21).await.unwrap();
        assert_eq!((episode.season_number, episode.episode_number), (2, 7));
        assert_eq!(episode.title.as_deref(), Some("The Climb"));
        assert!(client.get_episode(22).await.is_none());
    }

    #[tokio::test]
    async fn test_queue_failure_is_empty() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/queue");
            then.status(500);
        });

        assert!(client_for(&server).get_queue().await.is_empty());
    }

    #[tokio::test]
    async fn test_episodes_by_series() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/episode")
                .query_param("seriesId", "3");
            then.status(200).json_body(json!([
                { "id": 1, "seriesId": 3, "seasonNumber": 1, "episodeNumber": 1, "hasFile": true, "episodeFileId": 9 }
            ]));
        });

        let episodes = client_for(&server).get_episodes_by_series(3).await.unwrap();
        assert_eq!(episodes[0].episode_file_id, Some(9));
    }

    #[tokio::test]
    async fn test_episode_file_fetch_failure_is_empty_inventory() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/episodefile");
            then.status(500);
        });

        let resource = AcquisitionResource::Series {
            id: 3,
            content_id: 1399,
            title: "Game of Thrones".to_string(),
        };
        assert!(client_for(&server).file_inventory(&resource).await.is_empty());
    }

    #[tokio::test]
    async fn test_inventory_carries_episode_coordinates() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/episodefile")
                .query_param("seriesId", "3");
            then.status(200).json_body(json!([
                { "id": 40, "seriesId": 3, "seasonNumber": 1, "relativePath": "S01E01-E02.mkv" },
                { "id": 41, "seriesId": 3, "seasonNumber": 2, "relativePath": "S02E05.mkv" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/episode")
                .query_param("seriesId", "3");
            then.status(200).json_body(json!([
                { "id": 1, "seasonNumber": 1, "episodeNumber": 2, "hasFile": true, "episodeFileId": 40 },
                { "id": 2, "seasonNumber": 1, "episodeNumber": 1, "hasFile": true, "episodeFileId": 40 },
                { "id": 3, "seasonNumber": 2, "episodeNumber": 5, "hasFile": true, "episodeFileId": 41 },
                { "id": 4, "seasonNumber": 2, "episodeNumber": 6, "hasFile": false, "episodeFileId": 0 }
            ]));
        });

        let resource = AcquisitionResource::Series {
            id: 3,
            content_id: 1399,
            title: "Game of Thrones".to_string(),
        };
        let files = client_for(&server).file_inventory(&resource).await;

        let coordinates: Vec<(i64, Option<i32>, Vec<i32>)> = files
            .into_iter()
            .map(|f| (f.id, f.season_number, f.episode_numbers))
            .collect();
        assert_eq!(
            coordinates,
            vec![(40, Some(1), vec![1, 2]), (41, Some(2), vec![5])]
        );
    }

    #[tokio::test]
    async fn test_inventory_survives_episode_listing_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/episodefile");
            then.status(200)
                .json_body(json!([{ "id": 40, "seriesId": 3, "seasonNumber": 1 }]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/episode");
            then.status(500);
        });

        let resource = AcquisitionResource::Series {
            id: 3,
            content_id: 1399,
            title: "Game of Thrones".to_string(),
        };
        let files = client_for(&server).file_inventory(&resource).await;

        assert_eq!(files.len(), 1);
        assert!(files[0].episode_numbers.is_empty());
    }

    #[tokio::test]
    async fn test_find_series_maps_to_resource() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/series");
            then.status(200).json_body(json!([
                { "id": 3, "title": "Game of Thrones", "tmdbId": 1399, "tvdbId": 121361 }
            ]));
        });

        let client = client_for(&server);
        let resource = client.find_by_content_id(1399).await.unwrap();
        assert_eq!(
            resource,
            Some(AcquisitionResource::Series {
                id: 3,
                content_id: 1399,
                title: "Game of Thrones".to_string(),
            })
        );
        assert!(client.find_by_content_id(1).await.unwrap().is_none());
    }
}
