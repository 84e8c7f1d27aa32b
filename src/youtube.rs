// YouTube Data API v3 client
// Backs both the channel statistics fan-out and the show catalog

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::debug;

use crate::catalog::{VideoCatalogProvider, VideoSummary};
use crate::stats::{ChannelStatSnapshot, FetchFailure, StatsProvider};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_BASE.to_string(),
            request_timeout_ms: 8000,
        }
    }
}

// Wire types, counters arrive as decimal strings
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StatisticsItem {
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetailsItem {
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: Option<Snippet>,
    content_details: Option<PlaylistItemDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
}

pub struct YouTubeClient {
    http: Client,
    config: YouTubeConfig,
}

impl YouTubeClient {
    pub fn new(config: YouTubeConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { http, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchFailure> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(FetchFailure::Unavailable)?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource);

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", key)])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = ensure_success(response)?;
        response
            .json::<T>()
            .await
            .map_err(|e| FetchFailure::Malformed(e.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Http(err.to_string())
    }
}

fn ensure_success(response: Response) -> Result<Response, FetchFailure> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchFailure::Http(format!("status {}", status)))
    }
}

fn parse_counter(field: &str, value: Option<&str>) -> Result<Option<u64>, FetchFailure> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| FetchFailure::Malformed(format!("{} is not a number: {:?}", field, raw)))
        })
        .transpose()
}

// First item's statistics; missing video and view counters count as zero
fn snapshot_from_response(
    source_id: &str,
    body: ListResponse<StatisticsItem>,
) -> Result<ChannelStatSnapshot, FetchFailure> {
    let statistics = body
        .items
        .into_iter()
        .next()
        .ok_or_else(|| FetchFailure::Malformed("no channel items".to_string()))?
        .statistics
        .ok_or_else(|| FetchFailure::Malformed("missing statistics".to_string()))?;

    Ok(ChannelStatSnapshot {
        source_id: source_id.to_string(),
        subscriber_count: parse_counter("subscriberCount", statistics.subscriber_count.as_deref())?,
        video_count: parse_counter("videoCount", statistics.video_count.as_deref())?.unwrap_or(0),
        view_count: parse_counter("viewCount", statistics.view_count.as_deref())?.unwrap_or(0),
    })
}

fn video_from_item(item: PlaylistItem) -> Option<VideoSummary> {
    let id = item.content_details?.video_id;
    let snippet = item.snippet?;
    Some(VideoSummary {
        url: format!("https://www.youtube.com/watch?v={}", id),
        id,
        title: snippet.title,
        description: snippet.description,
        thumbnail: snippet
            .thumbnails
            .and_then(|t| t.high)
            .map(|t| t.url)
            .unwrap_or_default(),
        published_at: snippet.published_at,
    })
}

#[async_trait]
impl StatsProvider for YouTubeClient {
    fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn fetch_channel(&self, source_id: &str) -> Result<ChannelStatSnapshot, FetchFailure> {
        let body: ListResponse<StatisticsItem> = self
            .get_json("channels", &[("part", "statistics"), ("id", source_id)])
            .await?;
        let snapshot = snapshot_from_response(source_id, body)?;
        debug!(channel = %source_id, subscribers = ?snapshot.subscriber_count, "fetched channel statistics");
        Ok(snapshot)
    }
}

#[async_trait]
impl VideoCatalogProvider for YouTubeClient {
    fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn uploads_playlist(&self, channel_id: &str) -> Result<String, FetchFailure> {
        let body: ListResponse<ContentDetailsItem> = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        body.items
            .into_iter()
            .next()
            .and_then(|item| item.content_details)
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .ok_or_else(|| FetchFailure::Malformed("missing uploads playlist".to_string()))
    }

    async fn latest_videos(
        &self,
        playlist_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoSummary>, FetchFailure> {
        let max = max_results.to_string();
        let body: ListResponse<PlaylistItem> = self
            .get_json(
                "playlistItems",
                &[
                    ("part", "snippet,contentDetails"),
                    ("maxResults", max.as_str()),
                    ("playlistId", playlist_id),
                ],
            )
            .await?;

        Ok(body.items.into_iter().filter_map(video_from_item).collect())
    }
}
