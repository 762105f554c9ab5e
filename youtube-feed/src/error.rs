//! Failure types.
//!
//! [`ApiError`] describes one failed round trip to the remote API. [`FetchError`] is what a
//! logical fetch surfaces once the retry policy has given up; it is the only failure the
//! rendering layer ever sees.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error reasons the API uses to signal that the credential's quota window is spent.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "dailyLimitExceededUnreg"];

/// A single failed request to the YouTube Data API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("YouTube API {endpoint} request failed with status {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        /// Machine-readable reason from the error body, if it had one.
        reason: Option<String>,
        message: String,
    },

    #[error("send request to YouTube API endpoint {endpoint}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("parse YouTube API {endpoint} response as JSON")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The channel lookup succeeded but returned no channel.
    #[error("channel {channel_id} not found")]
    ChannelNotFound { channel_id: String },
}

impl ApiError {
    /// Returns the quota reason if this failure means the quota is exhausted.
    pub fn quota_reason(&self) -> Option<String> {
        let ApiError::Status {
            status,
            reason,
            message,
            ..
        } = self
        else {
            return None;
        };

        if let Some(reason) = reason
            && QUOTA_REASONS.contains(&reason.as_str())
        {
            return Some(reason.clone());
        }
        if *status == StatusCode::FORBIDDEN && message.to_ascii_lowercase().contains("quota") {
            return Some(message.clone());
        }
        None
    }

    /// Whether the target resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::ChannelNotFound { .. } => true,
            ApiError::Status { status, reason, .. } => {
                *status == StatusCode::NOT_FOUND
                    || reason.as_deref().is_some_and(|r| r.ends_with("NotFound"))
            }
            ApiError::Network { .. } | ApiError::Decode { .. } => false,
        }
    }

    /// Human-readable name of the missing resource, for [`FetchError::NotFound`].
    pub(crate) fn missing_resource(&self) -> String {
        match self {
            ApiError::ChannelNotFound { channel_id } => format!("channel {channel_id}"),
            ApiError::Status {
                endpoint,
                reason: Some(reason),
                ..
            } => format!("{endpoint} resource ({reason})"),
            ApiError::Status { endpoint, .. }
            | ApiError::Network { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => format!("{endpoint} resource"),
        }
    }
}

/// An unrecoverable outcome of a logical fetch.
///
/// Zero items is not an error; it is a successful, empty result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The credential's quota is spent. Retrying cannot help until the quota window resets.
    #[error("YouTube API quota exceeded: {reason}")]
    QuotaExceeded { reason: String },

    /// The configured channel or collection does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Every attempt failed with a retryable error.
    #[error("YouTube API request failed after {attempts} attempts")]
    TransientFailure {
        attempts: u32,
        #[source]
        last_error: Arc<ApiError>,
    },
}

/// The category of a [`FetchError`], for choosing a placeholder when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    QuotaExceeded,
    NotFound,
    TransientFailure,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            FetchError::NotFound { .. } => FailureKind::NotFound,
            FetchError::TransientFailure { .. } => FailureKind::TransientFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, reason: Option<&str>, message: &str) -> ApiError {
        ApiError::Status {
            endpoint: "search",
            status: StatusCode::from_u16(code).unwrap(),
            reason: reason.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn quota_reason_from_body() {
        let err = status(403, Some("quotaExceeded"), "The request cannot be completed");
        assert_eq!(err.quota_reason().as_deref(), Some("quotaExceeded"));

        let err = status(403, Some("dailyLimitExceeded"), "Daily Limit Exceeded");
        assert_eq!(err.quota_reason().as_deref(), Some("dailyLimitExceeded"));
    }

    #[test]
    fn quota_reason_from_message() {
        let err = status(403, None, "you have exceeded your Quota");
        assert!(err.quota_reason().is_some());

        // only a 403 counts when there is no explicit reason
        let err = status(500, None, "quota backend unavailable");
        assert!(err.quota_reason().is_none());
    }

    #[test]
    fn plain_forbidden_is_not_quota() {
        let err = status(403, Some("forbidden"), "Access forbidden");
        assert!(err.quota_reason().is_none());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_detection() {
        assert!(status(404, None, "Not Found").is_not_found());
        assert!(status(400, Some("playlistNotFound"), "no such playlist").is_not_found());
        assert!(
            ApiError::ChannelNotFound {
                channel_id: "UC123".to_string()
            }
            .is_not_found()
        );
        assert!(!status(503, None, "Backend Error").is_not_found());
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::QuotaExceeded).unwrap();
        assert_eq!(json, r#""quota_exceeded""#);
        let err = FetchError::NotFound {
            what: "channel UC123".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(err.to_string(), "channel UC123 not found");
    }
}
