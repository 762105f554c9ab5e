//! Failure classification and exponential backoff.

use crate::error::{ApiError, FetchError};
use std::sync::Arc;
use std::time::Duration;

/// How a failed request should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The quota is spent; no retry can succeed before the quota window resets.
    QuotaExceeded,
    /// The resource does not exist; no retry can succeed.
    NotFound,
    /// Anything else. May succeed if tried again.
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make another attempt.
    Retry { delay: Duration },
    /// Stop and surface the failure.
    GiveUp(ErrorClass),
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry { .. })
    }

    pub fn delay(&self) -> Duration {
        match self {
            RetryDecision::Retry { delay } => *delay,
            RetryDecision::GiveUp(_) => Duration::ZERO,
        }
    }
}

/// Progress of one logical request through its retries.
///
/// Lives only as long as the request; dropped on success or terminal failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Number of retries already made. The first attempt runs with `attempt == 0`.
    pub attempt: u32,
    pub next_delay: Duration,
}

impl RetryState {
    /// Total requests made so far, counting the one that just failed.
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }
}

/// Decides whether and when a failed request is re-attempted.
///
/// The policy itself is stateless; callers carry a [`RetryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Classifies a failure. Quota exhaustion takes priority over not-found.
    pub fn classify(error: &ApiError) -> ErrorClass {
        if error.quota_reason().is_some() {
            ErrorClass::QuotaExceeded
        } else if error.is_not_found() {
            ErrorClass::NotFound
        } else {
            ErrorClass::Transient
        }
    }

    /// `base_delay * 2^attempt`, saturating.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decides what to do after `error` ended the request made with retry count `attempt`.
    pub fn should_retry(&self, error: &ApiError, attempt: u32) -> RetryDecision {
        match Self::classify(error) {
            ErrorClass::Transient if attempt < self.max_retries => RetryDecision::Retry {
                delay: self.backoff(attempt),
            },
            class => RetryDecision::GiveUp(class),
        }
    }

    /// Converts the failure that ended a request into what the caller sees.
    pub fn surface(error: ApiError, class: ErrorClass, attempts: u32) -> FetchError {
        match class {
            ErrorClass::QuotaExceeded => FetchError::QuotaExceeded {
                reason: error
                    .quota_reason()
                    .unwrap_or_else(|| "quota exceeded".to_string()),
            },
            ErrorClass::NotFound => FetchError::NotFound {
                what: error.missing_resource(),
            },
            ErrorClass::Transient => FetchError::TransientFailure {
                attempts,
                last_error: Arc::new(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn status(code: u16, reason: Option<&str>) -> ApiError {
        ApiError::Status {
            endpoint: "search",
            status: StatusCode::from_u16(code).unwrap(),
            reason: reason.map(str::to_string),
            message: "failure".to_string(),
        }
    }

    #[test]
    fn quota_is_never_retried() {
        let policy = RetryPolicy::default();
        let err = status(403, Some("quotaExceeded"));
        assert_eq!(
            policy.should_retry(&err, 0),
            RetryDecision::GiveUp(ErrorClass::QuotaExceeded)
        );
    }

    #[test]
    fn quota_wins_over_not_found() {
        // a 404 carrying a quota reason is still a quota failure
        let err = status(404, Some("quotaExceeded"));
        assert_eq!(RetryPolicy::classify(&err), ErrorClass::QuotaExceeded);
    }

    #[test]
    fn not_found_is_never_retried() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.should_retry(&status(404, None), 0),
            RetryDecision::GiveUp(ErrorClass::NotFound)
        );
        let err = ApiError::ChannelNotFound {
            channel_id: "UCnope".to_string(),
        };
        assert!(!policy.should_retry(&err, 0).should_retry());
        match RetryPolicy::surface(err, ErrorClass::NotFound, 1) {
            FetchError::NotFound { what } => assert_eq!(what, "channel UCnope"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let delays: Vec<_> = (0..4)
            .map(|attempt| policy.should_retry(&status(503, None), attempt).delay())
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn gives_up_at_max_retries() {
        let policy = RetryPolicy::default();
        let err = status(500, None);
        assert!(policy.should_retry(&err, 2).should_retry());
        assert_eq!(
            policy.should_retry(&err, 3),
            RetryDecision::GiveUp(ErrorClass::Transient)
        );
        assert_eq!(policy.should_retry(&err, 3).delay(), Duration::ZERO);

        match RetryPolicy::surface(err, ErrorClass::Transient, 4) {
            FetchError::TransientFailure {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.to_string().contains("500"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert!(!policy.should_retry(&status(502, None), 0).should_retry());
    }

    #[test]
    fn backoff_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.backoff(64), Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn retry_state_counts_attempts() {
        let state = RetryState::default();
        assert_eq!(state.attempts_made(), 1);
    }
}
