//! A quota-aware, cached client for the public collections of one YouTube channel.
//!
//! [`ResourceClient`] is the entry point. It answers "up to N items of this kind" from a
//! [`CacheStore`] when it can, and otherwise asks a [`PaginatedFetcher`], which walks the
//! remote pages behind a shared [`RateLimiter`] and a [`RetryPolicy`].
//!
//! ```no_run
//! # async fn demo() -> eyre::Result<()> {
//! use youtube_feed::{FeedConfig, FetchRequest, ResourceClient, ResourceKind};
//!
//! let config = FeedConfig::load("config.json").await?;
//! let client = ResourceClient::from_config(&config)?;
//! let videos = client.fetch(&FetchRequest::new(ResourceKind::Videos, 6)).await?;
//! for video in &videos {
//!     println!("{} {}", video.title, video.url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod item;
pub mod rate_limit;
pub mod retry;
pub mod youtube_api;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CacheStore, CacheTtl};
pub use client::ResourceClient;
pub use config::{FeedConfig, Tuning, VideoSource};
pub use error::{ApiError, FailureKind, FetchError};
pub use feed::{FeedSection, SectionOutcome, load_sections};
pub use fetcher::{ChannelDetails, FetchSettings, PaginatedFetcher};
pub use item::{FetchRequest, Filters, Item, LiveBroadcastContent, Page, ResourceKind};
pub use rate_limit::RateLimiter;
pub use retry::{ErrorClass, RetryDecision, RetryPolicy, RetryState};
