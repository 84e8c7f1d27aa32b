// Show catalog: latest uploads for each show, one channel per show

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::stats::FetchFailure;

pub const DEFAULT_MAX_VIDEOS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowCategory {
    pub id: String,
    pub name: String,
    pub channel_id: String,
}

impl ShowCategory {
    pub fn new(id: &str, name: &str, channel_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            channel_id: channel_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowVideos {
    pub id: String,
    pub name: String,
    pub videos: Vec<VideoSummary>,
}

#[async_trait]
pub trait VideoCatalogProvider: Send + Sync + 'static {
    fn is_available(&self) -> bool {
        true
    }

    async fn uploads_playlist(&self, channel_id: &str) -> Result<String, FetchFailure>;

    async fn latest_videos(
        &self,
        playlist_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoSummary>, FetchFailure>;
}

pub fn default_shows() -> Vec<ShowCategory> {
    vec![
        ShowCategory::new("obinna-show", "The Obinna Show", "UCe68ABxGwMZO3J8y_gerZ6A"),
        ShowCategory::new(
            "obinna-show-extra",
            "The Obinna Show Extra",
            "UC_9xRXWjRrz_Jy7SWhUnBBw",
        ),
        ShowCategory::new("obinnaz", "The Obinnaz", "UCSVT1XTcae5Flp94OODu4mw"),
        ShowCategory::new("zabe", "Zabe", "UCEMsE6ZgO2sYnFBGxQK9vPA"),
    ]
}

pub struct ShowCatalog {
    provider: Arc<dyn VideoCatalogProvider>,
    shows: Vec<ShowCategory>,
    max_videos: usize,
}

impl ShowCatalog {
    pub fn new(provider: Arc<dyn VideoCatalogProvider>, shows: Vec<ShowCategory>, max_videos: usize) -> Self {
        Self {
            provider,
            shows,
            max_videos,
        }
    }

    pub fn shows(&self) -> &[ShowCategory] {
        &self.shows
    }

    async fn videos_for(&self, show: &ShowCategory) -> Result<Vec<VideoSummary>, FetchFailure> {
        let playlist = self.provider.uploads_playlist(&show.channel_id).await?;
        let mut videos = self.provider.latest_videos(&playlist, self.max_videos).await?;
        videos.truncate(self.max_videos);
        Ok(videos)
    }

    /// Latest uploads per show, in configured show order.
    ///
    /// Shows whose lookups fail are left out.
    pub async fn latest(&self) -> Vec<ShowVideos> {
        if !self.provider.is_available() {
            warn!("video catalog provider not configured, returning empty catalog");
            return Vec::new();
        }

        let lookups = self.shows.iter().map(|show| async move {
            (show, self.videos_for(show).await)
        });

        let mut catalog = Vec::with_capacity(self.shows.len());
        for (show, result) in join_all(lookups).await {
            match result {
                Ok(videos) => catalog.push(ShowVideos {
                    id: show.id.clone(),
                    name: show.name.clone(),
                    videos,
                }),
                Err(e) => warn!(show = %show.id, error = %e, "failed to fetch videos for show"),
            }
        }

        info!(shows = catalog.len(), "show catalog loaded");
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockCatalog {
        playlists: HashMap<String, String>,
        videos: HashMap<String, usize>,
        calls: AtomicUsize,
        unavailable: bool,
    }

    fn video(n: usize) -> VideoSummary {
        VideoSummary {
            id: format!("v{}", n),
            title: format!("Video {}", n),
            description: String::new(),
            thumbnail: String::new(),
            published_at: String::new(),
            url: format!("https://www.youtube.com/watch?v=v{}", n),
        }
    }

    #[async_trait]
    impl VideoCatalogProvider for MockCatalog {
        fn is_available(&self) -> bool {
            !self.unavailable
        }

        async fn uploads_playlist(&self, channel_id: &str) -> Result<String, FetchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.playlists
                .get(channel_id)
                .cloned()
                .ok_or_else(|| FetchFailure::Malformed("missing uploads playlist".into()))
        }

        async fn latest_videos(&self, playlist_id: &str, _max: usize) -> Result<Vec<VideoSummary>, FetchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let count = self.videos.get(playlist_id).copied().unwrap_or(0);
            Ok((0..count).map(video).collect())
        }
    }

    fn shows() -> Vec<ShowCategory> {
        vec![
            ShowCategory::new("one", "One", "UC1"),
            ShowCategory::new("two", "Two", "UC2"),
            ShowCategory::new("three", "Three", "UC3"),
        ]
    }

    #[tokio::test]
    async fn test_failed_show_is_omitted() {
        let mut mock = MockCatalog::default();
        mock.playlists.insert("UC1".into(), "PL1".into());
        mock.playlists.insert("UC3".into(), "PL3".into());
        mock.videos.insert("PL1".into(), 2);
        mock.videos.insert("PL3".into(), 20);

        let catalog = ShowCatalog::new(Arc::new(mock), shows(), DEFAULT_MAX_VIDEOS);
        let result = catalog.latest().await;

        let ids: Vec<&str> = result.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "three"]);
        assert_eq!(result[0].videos.len(), 2);
        assert_eq!(result[1].videos.len(), DEFAULT_MAX_VIDEOS);
    }

    #[tokio::test]
    async fn test_unavailable_provider_yields_empty_catalog() {
        let mock = Arc::new(MockCatalog {
            unavailable: true,
            ..Default::default()
        });
        let catalog = ShowCatalog::new(mock.clone(), shows(), DEFAULT_MAX_VIDEOS);

        assert!(catalog.latest().await.is_empty());
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_shows_are_distinct() {
        let shows = default_shows();
        assert_eq!(shows.len(), 4);
        assert_eq!(shows[0].id, "obinna-show");
        assert!(shows.iter().all(|s| s.channel_id.starts_with("UC")));
    }
}
