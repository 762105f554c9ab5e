//! YouTube Search API types.

use crate::youtube_api::types::{PageInfo, ResourceId, Thumbnails};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    /// Results matching the query, in the order the API ranked them.
    ///
    /// Absent from the body when the page is empty.
    #[serde(default)]
    pub items: VecDeque<SearchResult>,
    #[serde(rename = "pageInfo", default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/// A search result points at a video, channel, or playlist.
///
/// Requests made by this crate use `type=video`, so `id.videoId` is expected to be set.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: ResourceId,
    pub snippet: SearchResultSnippet,
}

/// See: <https://developers.google.com/youtube/v3/docs/search#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// The creation time of the resource the result identifies.
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    /// `live`, `upcoming`, or `none`.
    #[serde(
        rename = "liveBroadcastContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub live_broadcast_content: Option<String>,
}
