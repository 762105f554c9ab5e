//! Shared wire types and streaming infrastructure for the YouTube API client.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::Stream;

type OneFuturePage<'a, F, T, E> =
    Pin<Box<dyn Future<Output = Result<(F, (VecDeque<T>, Option<String>)), E>> + 'a + Send>>;

/// Items of a token-paged collection, yielded one at a time.
///
/// `fetcher` is called with `None` for the first page and with each returned `nextPageToken`
/// after that. The next page is requested only once the buffered one is drained. The first
/// error ends the stream.
pub struct PagedStream<'a, T, E, F> {
    /// Items of the last page not yet yielded
    current_items: VecDeque<T>,
    /// The request for the next page, if there is one
    pending_request: Option<OneFuturePage<'a, F, T, E>>,
    is_done: bool,
}

impl<'a, T, E, F> PagedStream<'a, T, E, F> {
    /// The first page is requested on first poll.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = Result<(VecDeque<T>, Option<String>), E>> + Send + 'a,
        T: 'a,
        E: 'a,
    {
        let first_page = async move {
            let results = fetcher(None).await?;
            Ok((fetcher, results))
        };
        Self {
            pending_request: Some(Box::pin(first_page)),
            current_items: VecDeque::new(),
            is_done: false,
        }
    }
}

impl<'a, T: Unpin, E, F> Unpin for PagedStream<'a, T, E, F> {}

impl<'a, T: Unpin, E, F, Fut> Stream for PagedStream<'a, T, E, F>
where
    F: Fn(Option<String>) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = Result<(VecDeque<T>, Option<String>), E>> + Send + 'a,
    T: 'a,
    E: 'a,
{
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if self.is_done {
                return Poll::Ready(None);
            }

            let Some(pending) = self.pending_request.as_mut() else {
                self.is_done = true;
                return Poll::Ready(None);
            };

            match pending.as_mut().poll(cx) {
                Poll::Ready(Ok((fetcher, (items, next_token)))) => {
                    self.current_items.extend(items);

                    if let Some(next_token) = next_token {
                        // set up the next page, but don't poll it until this one is drained
                        self.pending_request = Some(Box::pin(async move {
                            let results = fetcher(Some(next_token)).await?;
                            Ok((fetcher, results))
                        }));
                    } else {
                        self.is_done = true;
                        self.pending_request = None;
                    }
                }
                Poll::Ready(Err(e)) => {
                    self.pending_request = None;
                    self.is_done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Result counts reported by list endpoints.
///
/// Only present when the `fields` selection asks for it.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// Approximate; the API caps it for search results.
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}

/// The thumbnail images associated with a resource.
///
/// See: <https://developers.google.com/youtube/v3/docs/thumbnails>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Thumbnail>,
}

impl Thumbnails {
    /// The medium thumbnail URL, falling back to `high` and then `default`.
    ///
    /// Returns an empty string when the resource has no thumbnails at all.
    pub fn best_url(&self) -> String {
        [&self.medium, &self.high, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .next()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Identifies the resource a search result or playlist entry points at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceId {
    /// Only set when the referenced resource is a video.
    #[serde(rename = "videoId", default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Body the API returns alongside a non-2xx status.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable cause, e.g. `quotaExceeded` or `channelNotFound`.
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// The first machine-readable reason, if the body carries one.
    pub fn reason(&self) -> Option<&str> {
        self.error
            .errors
            .iter()
            .map(|e| e.reason.as_str())
            .find(|r| !r.is_empty())
    }
}
