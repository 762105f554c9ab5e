//! In-memory cache of the most recent successful fetch per resource kind.

use crate::item::{Item, ResourceKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// How long cached results stay servable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    /// Lifetime for videos and playlists.
    pub standard: Duration,
    /// Lifetime for live items, whose state changes faster.
    pub live: Duration,
}

impl CacheTtl {
    pub fn for_kind(&self, kind: ResourceKind) -> Duration {
        if kind.is_live() {
            self.live
        } else {
            self.standard
        }
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            standard: Duration::from_secs(5 * 60),
            live: Duration::from_secs(60),
        }
    }
}

/// The result of the last successful fetch for one kind.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub kind: ResourceKind,
    /// Items in the order the remote API returned them.
    pub items: Arc<[Item]>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }
}

/// One slot per [`ResourceKind`], each replaced wholesale on refresh.
///
/// Nothing is persisted; the cache lives as long as the process.
#[derive(Debug, Default)]
pub struct CacheStore {
    ttl: CacheTtl,
    entries: Mutex<HashMap<ResourceKind, CacheEntry>>,
}

impl CacheStore {
    pub fn new(ttl: CacheTtl) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    /// Returns the entry for `kind` if one exists and is younger than the kind's TTL.
    pub fn get(&self, kind: ResourceKind) -> Option<CacheEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&kind)?;
        let age = entry.age();
        if age >= self.ttl.for_kind(kind) {
            tracing::debug!(%kind, age_ms = age.as_millis() as u64, "cache entry expired");
            return None;
        }
        Some(entry.clone())
    }

    /// Replaces whatever is cached for `kind` with `items`, stamped now.
    pub fn put(&self, kind: ResourceKind, items: Arc<[Item]>) {
        let entry = CacheEntry {
            kind,
            items,
            fetched_at: Instant::now(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.insert(kind, entry).is_some() {
            tracing::info!(%kind, "refreshed cache entry");
        }
    }

    /// Makes the next [`get`](Self::get) for `kind` miss.
    pub fn invalidate(&self, kind: ResourceKind) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(&kind).is_some() {
            tracing::debug!(%kind, "invalidated cache entry");
        }
    }
}
