//! YouTube Data API v3 client library.
//!
//! This module covers the read-only, API-key authenticated endpoints needed to list a channel's
//! public collections:
//!
//! - [`search`]: `search.list`, used for a channel's videos and for live or upcoming broadcasts
//! - [`playlists`]: `playlists.list`, the channel's playlists
//! - [`playlist_items`]: `playlistItems.list`, used to walk the channel's uploads playlist
//! - [`channels`]: `channels.list`, used to confirm the channel exists and find its uploads
//!
//! All list endpoints share the same paging scheme: a response carries an optional
//! `nextPageToken`, which is passed back as `pageToken` to get the following page. An absent
//! token means the collection is exhausted.
//!
//! The transport ([`YouTubeClient`]) makes exactly one HTTP round trip per call. Rate limiting,
//! retries and caching live in the crate root modules.

pub mod channels;
pub mod client;
pub mod playlist_items;
pub mod playlists;
pub mod search;
pub mod types;

pub use client::{DEFAULT_BASE_URL, Query, YouTubeClient};
pub use types::{PageInfo, PagedStream, Thumbnails};
