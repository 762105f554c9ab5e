//! The normalized data model handed to callers.

use crate::youtube_api::playlist_items::PlaylistItem;
use crate::youtube_api::playlists::Playlist;
use crate::youtube_api::search::SearchResult;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Extra query parameters a caller wants applied to a fetch, such as `eventType=upcoming`.
pub type Filters = BTreeMap<String, String>;

/// The collection types this crate can fetch for a channel.
///
/// Each kind has its own endpoint, query parameters, and cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Videos,
    Playlists,
    LiveItems,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Videos,
        ResourceKind::Playlists,
        ResourceKind::LiveItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Videos => "videos",
            ResourceKind::Playlists => "playlists",
            ResourceKind::LiveItems => "live_items",
        }
    }

    /// Live kinds change state quickly and get a shorter cache lifetime.
    pub fn is_live(&self) -> bool {
        matches!(self, ResourceKind::LiveItems)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a video is a live broadcast, as reported by `snippet.liveBroadcastContent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveBroadcastContent {
    Live,
    Upcoming,
    #[serde(other)]
    None,
}

impl LiveBroadcastContent {
    fn parse(value: &str) -> Self {
        match value {
            "live" => LiveBroadcastContent::Live,
            "upcoming" => LiveBroadcastContent::Upcoming,
            _ => LiveBroadcastContent::None,
        }
    }
}

/// One entry of a fetched collection.
///
/// Items are immutable values; the crate never interprets them beyond these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ResourceKind,
    /// Video id for [`ResourceKind::Videos`] and [`ResourceKind::LiveItems`], playlist id otherwise.
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Timestamp,
    pub thumbnail_url: String,
    /// Number of videos in the playlist. Only set for [`ResourceKind::Playlists`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_broadcast_content: Option<LiveBroadcastContent>,
}

impl Item {
    /// The public YouTube URL for this item.
    pub fn url(&self) -> String {
        match self.kind {
            ResourceKind::Playlists => format!("https://www.youtube.com/playlist?list={}", self.id),
            ResourceKind::Videos | ResourceKind::LiveItems => {
                format!("https://www.youtube.com/watch?v={}", self.id)
            }
        }
    }

    /// Normalizes a `search.list` result. Results that are not videos yield `None`.
    pub(crate) fn from_search_result(kind: ResourceKind, result: SearchResult) -> Option<Self> {
        let Some(id) = result.id.video_id else {
            tracing::warn!(%kind, title = %result.snippet.title, "skipping search result without a video id");
            return None;
        };
        let snippet = result.snippet;
        Some(Self {
            kind,
            id,
            thumbnail_url: snippet.thumbnails.best_url(),
            title: snippet.title,
            description: snippet.description,
            published_at: snippet.published_at,
            item_count: None,
            live_broadcast_content: snippet
                .live_broadcast_content
                .as_deref()
                .map(LiveBroadcastContent::parse),
        })
    }

    pub(crate) fn from_playlist(playlist: Playlist) -> Self {
        let snippet = playlist.snippet;
        Self {
            kind: ResourceKind::Playlists,
            id: playlist.id,
            thumbnail_url: snippet.thumbnails.best_url(),
            title: snippet.title,
            description: snippet.description,
            published_at: snippet.published_at,
            item_count: Some(playlist.content_details.item_count),
            live_broadcast_content: None,
        }
    }

    /// Normalizes an uploads-playlist entry into a video item.
    pub(crate) fn from_playlist_item(kind: ResourceKind, entry: PlaylistItem) -> Option<Self> {
        let snippet = entry.snippet;
        let Some(id) = snippet.resource_id.video_id else {
            tracing::warn!(%kind, title = %snippet.title, "skipping playlist entry without a video id");
            return None;
        };
        Some(Self {
            kind,
            id,
            thumbnail_url: snippet.thumbnails.best_url(),
            title: snippet.title,
            description: snippet.description,
            published_at: snippet.published_at,
            item_count: None,
            live_broadcast_content: None,
        })
    }
}

/// One batch of items plus the cursor for the next batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Item>,
    /// `None` means the remote collection has no further pages.
    pub next_page_token: Option<String>,
}

/// A request for up to `desired_count` items of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: ResourceKind,
    pub desired_count: usize,
    pub filters: Filters,
}

impl FetchRequest {
    pub fn new(kind: ResourceKind, desired_count: usize) -> Self {
        Self {
            kind,
            desired_count,
            filters: Filters::new(),
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }
}
