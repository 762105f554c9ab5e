//! Core YouTube API transport: one request in, one typed response or [`ApiError`] out.
//!
//! Nothing in this module retries or rate limits; that is layered on top by
//! [`PaginatedFetcher`](crate::fetcher::PaginatedFetcher).

use crate::error::ApiError;
use crate::youtube_api::{
    channels::ChannelListResponse, playlist_items::PlaylistItemListResponse,
    playlists::PlaylistListResponse, search::SearchListResponse, types::ErrorResponse,
};
use eyre::Context;
use http::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Ordered query parameters for a request.
///
/// [`Query::set`] replaces an existing parameter of the same name in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Client for the read-only parts of the YouTube Data API v3, authenticated by API key.
#[derive(Clone)]
pub struct YouTubeClient {
    api_key: String,
    base_url: String,
    /// HTTP client for API requests
    client: reqwest::Client,
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YouTubeClient {
    /// Creates a client that sends `api_key` with every request to `base_url`.
    ///
    /// `base_url` is normally [`DEFAULT_BASE_URL`]; tests point it at a mock server.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Like [`YouTubeClient::new`], but builds an HTTP client that bounds every request by
    /// `timeout`.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("youtube-feed/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self::new(api_key, base_url, client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Makes a single request to `endpoint` and decodes the JSON body.
    ///
    /// The API key is appended to `query`. Non-2xx responses become [`ApiError::Status`]
    /// carrying the error reason from the body when the body has the standard error shape.
    #[instrument(skip(self, query), level = tracing::Level::TRACE)]
    pub(crate) async fn make_request<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &'static str,
        query: &Query,
    ) -> Result<R, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .request(method, &url)
            .query(query.pairs())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ApiError::Network { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let body = serde_json::from_str::<ErrorResponse>(&error_text).ok();
            let reason = body.as_ref().and_then(|b| b.reason()).map(str::to_string);
            let message = body
                .map(|b| b.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or(error_text);
            return Err(ApiError::Status {
                endpoint,
                status,
                reason,
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })
    }

    /// Calls `search.list`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    pub async fn search(&self, query: &Query) -> Result<SearchListResponse, ApiError> {
        let response: SearchListResponse =
            self.make_request(Method::GET, "search", query).await?;
        tracing::debug!(
            returned_items = response.items.len(),
            has_next_page = response.next_page_token.is_some(),
            "fetched search results"
        );
        Ok(response)
    }

    /// Calls `playlists.list`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    pub async fn list_playlists(&self, query: &Query) -> Result<PlaylistListResponse, ApiError> {
        let response: PlaylistListResponse =
            self.make_request(Method::GET, "playlists", query).await?;
        tracing::debug!(
            returned_items = response.items.len(),
            has_next_page = response.next_page_token.is_some(),
            "fetched playlists"
        );
        Ok(response)
    }

    /// Calls `playlistItems.list`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    pub async fn list_playlist_items(
        &self,
        query: &Query,
    ) -> Result<PlaylistItemListResponse, ApiError> {
        let response: PlaylistItemListResponse =
            self.make_request(Method::GET, "playlistItems", query).await?;
        tracing::debug!(
            returned_items = response.items.len(),
            has_next_page = response.next_page_token.is_some(),
            "fetched playlist items"
        );
        Ok(response)
    }

    /// Looks up a channel by id with `channels.list`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    pub async fn list_channels(&self, channel_id: &str) -> Result<ChannelListResponse, ApiError> {
        let mut query = Query::new();
        query
            .set("part", "id,contentDetails")
            .set("id", channel_id)
            .set("fields", "items(id,contentDetails/relatedPlaylists/uploads)");

        let response: ChannelListResponse =
            self.make_request(Method::GET, "channels", &query).await?;
        tracing::debug!(
            channel_id,
            returned_items = response.items.len(),
            "fetched channel"
        );
        Ok(response)
    }
}
