//! Turns "give me N items of this kind" into a sequence of gated, retried page requests.

use crate::config::{FeedConfig, MAX_PAGE_SIZE, VideoSource};
use crate::error::{ApiError, FetchError};
use crate::item::{Filters, Item, Page, ResourceKind};
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryDecision, RetryPolicy, RetryState};
use crate::youtube_api::{PagedStream, Query, YouTubeClient};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_stream::Stream;
use tracing::instrument;

const SEARCH_FIELDS: &str = "nextPageToken,items(id/videoId,snippet(title,description,publishedAt,thumbnails,liveBroadcastContent))";
const UPLOADS_FIELDS: &str = "nextPageToken,items(snippet(title,description,publishedAt,thumbnails,resourceId/videoId))";
const PLAYLIST_FIELDS: &str = "nextPageToken,items(id,contentDetails/itemCount,snippet(title,description,publishedAt,thumbnails))";

/// Query parameters the fetcher controls itself; caller filters cannot replace them.
const RESERVED_PARAMS: &[&str] = &["key", "maxResults", "pageToken"];

/// What to fetch, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub channel_id: String,
    /// Upper bound on `maxResults` for a single page.
    pub max_page_size: u32,
    pub video_source: VideoSource,
    /// Query upcoming broadcasts when nothing is live.
    pub upcoming_fallback: bool,
    /// Confirm the channel exists before the first collection request.
    pub verify_channel: bool,
}

impl FetchSettings {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            max_page_size: MAX_PAGE_SIZE,
            video_source: VideoSource::Search,
            upcoming_fallback: true,
            verify_channel: true,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            channel_id: config.channel_id.clone(),
            max_page_size: config.tuning.max_page_size,
            video_source: config.video_source,
            upcoming_fallback: config.show_upcoming,
            verify_channel: config.tuning.verify_channel,
        }
    }

    fn page_size_for(&self, remaining: usize) -> u32 {
        let ceiling = self.max_page_size.clamp(1, MAX_PAGE_SIZE);
        u32::try_from(remaining).map_or(ceiling, |r| r.clamp(1, ceiling))
    }
}

/// The configured channel, as confirmed by `channels.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetails {
    pub id: String,
    pub uploads_playlist_id: Option<String>,
}

/// Fetches pages for one channel.
///
/// Every request, including retries, first waits on the shared [`RateLimiter`]. Failed requests
/// are classified by the [`RetryPolicy`]; only transient failures are re-attempted.
#[derive(Debug)]
pub struct PaginatedFetcher {
    api: YouTubeClient,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    settings: FetchSettings,
    channel: OnceCell<ChannelDetails>,
}

impl PaginatedFetcher {
    pub fn new(
        api: YouTubeClient,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        settings: FetchSettings,
    ) -> Self {
        Self {
            api,
            limiter,
            retry,
            settings,
            channel: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Runs `op` until it succeeds or the retry policy gives up.
    async fn with_retry<T, F, Fut>(&self, endpoint: &str, op: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut state = RetryState::default();
        loop {
            self.limiter.wait_for_slot().await;

            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match self.retry.should_retry(&error, state.attempt) {
                RetryDecision::Retry { delay } => {
                    tracing::warn!(
                        endpoint,
                        attempt = state.attempts_made(),
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "retrying YouTube API request"
                    );
                    state.next_delay = delay;
                    tokio::time::sleep(delay).await;
                    state.attempt += 1;
                }
                RetryDecision::GiveUp(class) => {
                    let failure = RetryPolicy::surface(error, class, state.attempts_made());
                    tracing::error!(endpoint, error = %failure, "YouTube API request failed");
                    return Err(failure);
                }
            }
        }
    }

    /// Looks the configured channel up once and remembers the answer.
    ///
    /// Concurrent callers share a single lookup. An empty response is
    /// [`FetchError::NotFound`]; failures are not remembered.
    #[instrument(skip(self), fields(channel_id = %self.settings.channel_id))]
    pub async fn resolve_channel(&self) -> Result<&ChannelDetails, FetchError> {
        self.channel
            .get_or_try_init(|| async {
                let channel_id = self.settings.channel_id.as_str();
                let channel = self
                    .with_retry("channels", || async {
                        self.api
                            .list_channels(channel_id)
                            .await?
                            .items
                            .pop_front()
                            .ok_or_else(|| ApiError::ChannelNotFound {
                                channel_id: channel_id.to_string(),
                            })
                    })
                    .await?;
                tracing::debug!(uploads = ?channel.uploads_playlist_id(), "resolved channel");
                Ok::<_, FetchError>(ChannelDetails {
                    uploads_playlist_id: channel.uploads_playlist_id().map(str::to_string),
                    id: channel.id,
                })
            })
            .await
    }

    fn needs_channel(&self, kind: ResourceKind) -> bool {
        self.settings.verify_channel
            || (kind == ResourceKind::Videos && self.settings.video_source == VideoSource::Uploads)
    }

    async fn prepare(&self, kind: ResourceKind) -> Result<(), FetchError> {
        if self.needs_channel(kind) {
            self.resolve_channel().await?;
        }
        Ok(())
    }

    fn page_query(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        page_token: Option<&str>,
        max_results: u32,
        uploads_playlist: Option<&str>,
    ) -> Query {
        let channel_id = self.settings.channel_id.as_str();
        let mut query = Query::new();
        match (kind, uploads_playlist) {
            (ResourceKind::Videos, Some(playlist_id)) => {
                query
                    .set("part", "snippet")
                    .set("playlistId", playlist_id)
                    .set("fields", UPLOADS_FIELDS);
            }
            (ResourceKind::Videos | ResourceKind::LiveItems, _) => {
                query
                    .set("part", "snippet")
                    .set("channelId", channel_id)
                    .set("order", "date")
                    .set("type", "video")
                    .set("fields", SEARCH_FIELDS);
                if kind == ResourceKind::LiveItems {
                    query.set("eventType", "live");
                }
            }
            (ResourceKind::Playlists, _) => {
                query
                    .set("part", "snippet,contentDetails")
                    .set("channelId", channel_id)
                    .set("fields", PLAYLIST_FIELDS);
            }
        }

        for (name, value) in filters {
            if RESERVED_PARAMS.contains(&name.as_str()) {
                tracing::warn!(%kind, filter = %name, "ignoring filter on a reserved query parameter");
                continue;
            }
            query.set(name.as_str(), value.as_str());
        }

        query.set("maxResults", max_results.to_string());
        if let Some(token) = page_token {
            query.set("pageToken", token);
        }
        query
    }

    /// One page of `kind`, at most `max_results` items, starting at `page_token`.
    #[instrument(skip(self, filters))]
    pub async fn fetch_page(
        &self,
        kind: ResourceKind,
        filters: &Filters,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Page, FetchError> {
        let uploads_playlist = if kind == ResourceKind::Videos
            && self.settings.video_source == VideoSource::Uploads
        {
            let channel = self.resolve_channel().await?;
            let playlist_id = channel.uploads_playlist_id.as_deref().ok_or_else(|| {
                FetchError::NotFound {
                    what: format!("uploads playlist of channel {}", channel.id),
                }
            })?;
            Some(playlist_id)
        } else {
            None
        };

        let query = self.page_query(kind, filters, page_token, max_results, uploads_playlist);
        let endpoint = match (kind, uploads_playlist) {
            (ResourceKind::Videos, Some(_)) => "playlistItems",
            (ResourceKind::Playlists, _) => "playlists",
            _ => "search",
        };

        self.with_retry(endpoint, || self.request_page(kind, &query, uploads_playlist.is_some()))
            .await
    }

    async fn request_page(
        &self,
        kind: ResourceKind,
        query: &Query,
        from_uploads: bool,
    ) -> Result<Page, ApiError> {
        let page = match kind {
            ResourceKind::Playlists => {
                let response = self.api.list_playlists(query).await?;
                Page {
                    items: response.items.into_iter().map(Item::from_playlist).collect(),
                    next_page_token: response.next_page_token,
                }
            }
            ResourceKind::Videos if from_uploads => {
                let response = self.api.list_playlist_items(query).await?;
                Page {
                    items: response
                        .items
                        .into_iter()
                        .filter_map(|entry| Item::from_playlist_item(kind, entry))
                        .collect(),
                    next_page_token: response.next_page_token,
                }
            }
            ResourceKind::Videos | ResourceKind::LiveItems => {
                let response = self.api.search(query).await?;
                Page {
                    items: response
                        .items
                        .into_iter()
                        .filter_map(|result| Item::from_search_result(kind, result))
                        .collect(),
                    next_page_token: response.next_page_token,
                }
            }
        };
        Ok(page)
    }

    /// Up to `desired_count` items of `kind`, in the order the API returned them.
    ///
    /// Fewer items are returned if the collection runs out first. For live items, an empty
    /// live result triggers one follow-up query for upcoming broadcasts.
    #[instrument(skip(self, filters))]
    pub async fn fetch_up_to(
        &self,
        kind: ResourceKind,
        desired_count: usize,
        filters: &Filters,
    ) -> Result<Vec<Item>, FetchError> {
        if desired_count == 0 {
            return Ok(Vec::new());
        }
        self.prepare(kind).await?;

        let items = self.collect_pages(kind, desired_count, filters).await?;
        if items.is_empty() && self.falls_back_to_upcoming(kind, filters) {
            tracing::info!(%kind, "nothing is live, checking upcoming broadcasts");
            let mut upcoming = filters.clone();
            upcoming.insert("eventType".to_string(), "upcoming".to_string());
            return self.collect_pages(kind, desired_count, &upcoming).await;
        }
        Ok(items)
    }

    fn falls_back_to_upcoming(&self, kind: ResourceKind, filters: &Filters) -> bool {
        kind.is_live()
            && self.settings.upcoming_fallback
            && filters
                .get("eventType")
                .is_none_or(|event_type| event_type == "live")
    }

    async fn collect_pages(
        &self,
        kind: ResourceKind,
        desired_count: usize,
        filters: &Filters,
    ) -> Result<Vec<Item>, FetchError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let page_size = self.settings.page_size_for(desired_count - items.len());
            let page = self
                .fetch_page(kind, filters, page_token.as_deref(), page_size)
                .await?;
            pages += 1;
            items.extend(page.items);

            if items.len() >= desired_count {
                break;
            }
            match page.next_page_token {
                None => break,
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    tracing::warn!(%kind, token = %next, "API returned the same page token twice, stopping");
                    break;
                }
                Some(next) => page_token = Some(next),
            }
        }

        items.truncate(desired_count);
        tracing::debug!(%kind, pages, returned_items = items.len(), "fetched collection");
        Ok(items)
    }

    /// Every item of `kind`, fetched lazily one page at a time.
    ///
    /// Results are not cached and no live fallback is applied.
    pub fn stream(
        &self,
        kind: ResourceKind,
        filters: Filters,
    ) -> impl Stream<Item = Result<Item, FetchError>> + use<'_> {
        PagedStream::new(move |page_token: Option<String>| {
            let filters = filters.clone();
            async move {
                if page_token.is_none() {
                    self.prepare(kind).await?;
                }
                let page = self
                    .fetch_page(
                        kind,
                        &filters,
                        page_token.as_deref(),
                        self.settings.page_size_for(usize::MAX),
                    )
                    .await?;
                Ok::<_, FetchError>((VecDeque::from(page.items), page.next_page_token))
            }
        })
    }
}
