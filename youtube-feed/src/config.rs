//! Static configuration supplied by the site setup tooling.
//!
//! The JSON shape matches the `youtube` block the setup wizard writes into `config.json`:
//!
//! ```json
//! {
//!   "apiKey": "AIza...",
//!   "channelId": "UC...",
//!   "maxVideos": 6,
//!   "showPlaylists": true,
//!   "maxPlaylists": 3,
//!   "showLiveVideos": true,
//!   "maxLiveVideos": 3
//! }
//! ```
//!
//! The whole `config.json` (with the block nested under `"youtube"`) is accepted as well.

use crate::cache::CacheTtl;
use crate::item::ResourceKind;
use crate::retry::RetryPolicy;
use crate::youtube_api::DEFAULT_BASE_URL;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `apiKey`, so the key can stay out of the config file.
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// The remote API never returns more than this many items per page.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Where the videos collection is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// `search.list` ordered by date.
    #[default]
    Search,
    /// The channel's uploads playlist via `playlistItems.list`, which costs far less quota.
    Uploads,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    pub api_key: String,
    pub channel_id: String,

    #[serde(default = "enabled")]
    pub show_videos: bool,
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,

    #[serde(default = "enabled")]
    pub show_playlists: bool,
    #[serde(default = "default_max_collection")]
    pub max_playlists: usize,

    #[serde(default = "enabled")]
    pub show_live_videos: bool,
    #[serde(default = "default_max_collection")]
    pub max_live_videos: usize,
    /// Fall back to upcoming broadcasts when nothing is live.
    #[serde(default = "enabled")]
    pub show_upcoming: bool,

    #[serde(default)]
    pub video_source: VideoSource,

    #[serde(default)]
    pub tuning: Tuning,
}

fn enabled() -> bool {
    true
}

fn default_max_videos() -> usize {
    6
}

fn default_max_collection() -> usize {
    3
}

/// Knobs for the fetch machinery. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    pub base_url: String,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub live_cache_ttl_secs: u64,
    pub max_page_size: u32,
    pub request_timeout_secs: u64,
    /// Confirm the channel exists before the first collection request.
    pub verify_channel: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_request_interval_ms: 100,
            max_retries: 3,
            base_delay_ms: 100,
            cache_ttl_secs: 5 * 60,
            live_cache_ttl_secs: 60,
            max_page_size: MAX_PAGE_SIZE,
            request_timeout_secs: 10,
            verify_channel: true,
        }
    }
}

impl Tuning {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            standard: Duration::from_secs(self.cache_ttl_secs),
            live: Duration::from_secs(self.live_cache_ttl_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FeedConfig {
    /// A configuration with every optional field at its default.
    pub fn new(api_key: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            channel_id: channel_id.into(),
            show_videos: true,
            max_videos: default_max_videos(),
            show_playlists: true,
            max_playlists: default_max_collection(),
            show_live_videos: true,
            max_live_videos: default_max_collection(),
            show_upcoming: true,
            video_source: VideoSource::default(),
            tuning: Tuning::default(),
        }
    }

    /// Parses either the bare `youtube` block or a full `config.json` containing one.
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).context("parse feed configuration as JSON")?;
        if let Some(youtube) = value.get_mut("youtube")
            && youtube.is_object()
        {
            value = youtube.take();
        }
        serde_json::from_value(value).context("parse feed configuration")
    }

    /// Reads, parses, and validates the configuration at `path`.
    ///
    /// A non-empty `YOUTUBE_API_KEY` environment variable replaces the file's `apiKey`.
    pub async fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read feed configuration from {}", path.display()))?;
        let mut config = Self::from_json_str(&json)?;
        config.override_api_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("using API key from {}", API_KEY_ENV);
            self.api_key = key;
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.api_key.trim().is_empty() {
            eyre::bail!("apiKey must not be empty (or set {})", API_KEY_ENV);
        }
        if self.channel_id.trim().is_empty() {
            eyre::bail!("channelId must not be empty");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.tuning.max_page_size) {
            eyre::bail!(
                "tuning.maxPageSize must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.tuning.max_page_size
            );
        }
        Ok(())
    }

    pub fn is_enabled(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Videos => self.show_videos,
            ResourceKind::Playlists => self.show_playlists,
            ResourceKind::LiveItems => self.show_live_videos,
        }
    }

    pub fn desired_count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Videos => self.max_videos,
            ResourceKind::Playlists => self.max_playlists,
            ResourceKind::LiveItems => self.max_live_videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_setup_wizard_block() {
        let config = FeedConfig::from_json_str(
            r#"{
                "apiKey": "AIzaTest",
                "channelId": "UCQjpnt3fOWSyN6JbTkDcPZQ",
                "maxVideos": 100,
                "showPlaylists": true,
                "maxPlaylists": 6,
                "showLiveVideos": false,
                "maxLiveVideos": 66
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_key, "AIzaTest");
        assert_eq!(config.desired_count(ResourceKind::Videos), 100);
        assert_eq!(config.desired_count(ResourceKind::Playlists), 6);
        assert_eq!(config.desired_count(ResourceKind::LiveItems), 66);
        assert!(config.is_enabled(ResourceKind::Videos));
        assert!(!config.is_enabled(ResourceKind::LiveItems));
        assert_eq!(config.video_source, VideoSource::Search);
        assert_eq!(config.tuning, Tuning::default());
    }

    #[test]
    fn parses_full_config_file() {
        let config = FeedConfig::from_json_str(
            r#"{
                "youtube": { "apiKey": "AIzaTest", "channelId": "UC123", "videoSource": "uploads" },
                "streaming": { "twitch": { "enabled": true, "username": "someone" } },
                "contactForm": { "service": "mailto" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.channel_id, "UC123");
        assert_eq!(config.video_source, VideoSource::Uploads);
        assert_eq!(config.max_videos, 6);
        assert_eq!(config.max_playlists, 3);
        assert!(config.show_upcoming);
    }

    #[test]
    fn partial_tuning_keeps_other_defaults() {
        let config = FeedConfig::from_json_str(
            r#"{ "apiKey": "k", "channelId": "c", "tuning": { "maxRetries": 5, "liveCacheTtlSecs": 30 } }"#,
        )
        .unwrap();
        assert_eq!(config.tuning.max_retries, 5);
        assert_eq!(config.tuning.cache_ttl().live, Duration::from_secs(30));
        assert_eq!(config.tuning.cache_ttl().standard, Duration::from_secs(300));
        assert_eq!(config.tuning.min_request_interval(), Duration::from_millis(100));
        assert_eq!(
            config.tuning.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(100))
        );
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let err = FeedConfig::from_json_str(r#"{ "apiKey": "k" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("channelId"), "{err:#}");
    }

    #[test]
    fn validation() {
        assert!(FeedConfig::new("k", "c").validate().is_ok());

        let err = FeedConfig::new("", "c").validate().unwrap_err();
        assert!(err.to_string().contains("apiKey"), "{err}");

        let err = FeedConfig::new("k", " ").validate().unwrap_err();
        assert!(err.to_string().contains("channelId"), "{err}");

        let mut config = FeedConfig::new("k", "c");
        config.tuning.max_page_size = 51;
        assert!(config.validate().is_err());
        config.tuning.max_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_override() {
        let mut config = FeedConfig::new("from-file", "c");
        config.override_api_key(None);
        assert_eq!(config.api_key, "from-file");
        config.override_api_key(Some("  ".to_string()));
        assert_eq!(config.api_key, "from-file");
        config.override_api_key(Some("from-env".to_string()));
        assert_eq!(config.api_key, "from-env");
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = FeedConfig::load("/definitely/not/here.json").await.unwrap_err();
        assert!(err.to_string().contains("read feed configuration"), "{err}");
    }
}
