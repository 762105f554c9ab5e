//! Fixtures shared by the unit tests.

use crate::config::FeedConfig;
use crate::fetcher::{FetchSettings, PaginatedFetcher};
use crate::item::{Item, ResourceKind};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::youtube_api::YouTubeClient;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub(crate) const CHANNEL_ID: &str = "UCtestchannel";
pub(crate) const API_KEY: &str = "test-key";

const PUBLISHED_AT: &str = "2024-03-01T12:00:00Z";

pub(crate) fn item(kind: ResourceKind, id: &str) -> Item {
    Item {
        kind,
        id: id.to_string(),
        title: format!("title {id}"),
        description: String::new(),
        published_at: PUBLISHED_AT.parse().unwrap(),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
        item_count: (kind == ResourceKind::Playlists).then_some(1),
        live_broadcast_content: None,
    }
}

fn snippet(id: &str) -> Value {
    json!({
        "title": format!("title {id}"),
        "description": "",
        "publishedAt": PUBLISHED_AT,
        "thumbnails": { "medium": { "url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg") } }
    })
}

fn with_token(mut page: Value, next: Option<&str>) -> Value {
    if let Some(next) = next {
        page["nextPageToken"] = json!(next);
    }
    page
}

/// A `search.list` body with one video per id.
pub(crate) fn search_page(ids: &[&str], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": { "kind": "youtube#video", "videoId": id }, "snippet": snippet(id) }))
        .collect();
    with_token(json!({ "items": items }), next)
}

/// A `playlists.list` body with one playlist per id.
pub(crate) fn playlist_page(ids: &[&str], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "contentDetails": { "itemCount": 1 }, "snippet": snippet(id) }))
        .collect();
    with_token(json!({ "items": items }), next)
}

/// A `playlistItems.list` body with one uploaded video per id.
pub(crate) fn upload_page(ids: &[&str], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| {
            let mut snippet = snippet(id);
            snippet["resourceId"] = json!({ "kind": "youtube#video", "videoId": id });
            json!({ "snippet": snippet })
        })
        .collect();
    with_token(json!({ "items": items }), next)
}

pub(crate) fn quota_exceeded() -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_json(json!({
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{ "domain": "youtube.quota", "reason": "quotaExceeded", "message": "quota" }]
        }
    }))
}

/// Answers `channels.list` for [`CHANNEL_ID`].
pub(crate) async fn mount_channel(server: &MockServer, uploads: Option<&str>) {
    let mut channel = json!({ "id": CHANNEL_ID });
    if let Some(uploads) = uploads {
        channel["contentDetails"] = json!({ "relatedPlaylists": { "uploads": uploads } });
    }
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", CHANNEL_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [channel] })))
        .mount(server)
        .await;
}

pub(crate) async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .collect()
}

/// A configuration pointed at `server`, with millisecond spacing and backoff.
pub(crate) fn config_for(server: &MockServer) -> FeedConfig {
    let mut config = FeedConfig::new(API_KEY, CHANNEL_ID);
    config.tuning.base_url = server.uri();
    config.tuning.min_request_interval_ms = 1;
    config.tuning.base_delay_ms = 1;
    config.tuning.request_timeout_secs = 5;
    config
}

pub(crate) fn fetcher_for(
    server: &MockServer,
    adjust: impl FnOnce(&mut FetchSettings),
) -> PaginatedFetcher {
    let mut settings = FetchSettings::new(CHANNEL_ID);
    adjust(&mut settings);
    let api = YouTubeClient::with_timeout(API_KEY, server.uri(), Duration::from_secs(5)).unwrap();
    PaginatedFetcher::new(
        api,
        Arc::new(RateLimiter::new(Duration::from_millis(1))),
        RetryPolicy::new(3, Duration::from_millis(1)),
        settings,
    )
}
