//! Per-kind results in the shape the page renderer consumes.

use crate::client::ResourceClient;
use crate::config::FeedConfig;
use crate::error::{FailureKind, FetchError};
use crate::item::{FetchRequest, Item, ResourceKind};
use serde::{Deserialize, Serialize};
use std::error::Error as _;

/// What happened when one section of the feed was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// Possibly empty; an empty section renders as "nothing here yet", not as an error.
    Items { items: Vec<Item> },
    /// Switched off in the configuration. No request was made.
    Disabled,
    /// The renderer shows a placeholder chosen by `failure`.
    Failed {
        failure: FailureKind,
        message: String,
    },
}

impl From<Result<Vec<Item>, FetchError>> for SectionOutcome {
    fn from(result: Result<Vec<Item>, FetchError>) -> Self {
        match result {
            Ok(items) => SectionOutcome::Items { items },
            Err(error) => SectionOutcome::Failed {
                failure: error.kind(),
                message: describe(&error),
            },
        }
    }
}

/// The error and every underlying cause, outermost first.
fn describe(error: &FetchError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSection {
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

impl FeedSection {
    /// The loaded items; empty for disabled or failed sections.
    pub fn items(&self) -> &[Item] {
        match &self.outcome {
            SectionOutcome::Items { items } => items,
            SectionOutcome::Disabled | SectionOutcome::Failed { .. } => &[],
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.outcome {
            SectionOutcome::Failed { failure, .. } => Some(failure),
            SectionOutcome::Items { .. } | SectionOutcome::Disabled => None,
        }
    }
}

/// Loads every section of the feed: videos, then playlists, then live items.
///
/// A failing section does not stop the ones after it.
pub async fn load_sections(client: &ResourceClient, config: &FeedConfig) -> Vec<FeedSection> {
    let mut sections = Vec::with_capacity(ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        let outcome = if config.is_enabled(kind) {
            let request = FetchRequest::new(kind, config.desired_count(kind));
            let outcome = SectionOutcome::from(client.fetch(&request).await);
            if let SectionOutcome::Failed { failure, message } = &outcome {
                tracing::warn!(%kind, ?failure, %message, "feed section failed to load");
            }
            outcome
        } else {
            tracing::debug!(%kind, "feed section disabled");
            SectionOutcome::Disabled
        };
        sections.push(FeedSection { kind, outcome });
    }
    sections
}
