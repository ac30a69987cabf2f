//! Retry policy and attempt classification.

use std::time::Duration;

use crate::domain::errors::HttpError;

use super::request::HttpResponse;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further one.
    pub base_delay: Duration,
    /// Upper bound of any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default delay cap.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry + 1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        let exponential = base.saturating_mul(2_u64.saturating_pow(retry.min(16)));
        Duration::from_millis(exponential.min(max))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}

/// Result of one dispatch attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 2xx response.
    Success(HttpResponse),
    /// Failure worth retrying.
    Retryable(HttpError),
    /// Failure that ends the request.
    Terminal(HttpError),
}

impl AttemptOutcome {
    /// Classifies an error.
    #[must_use]
    pub fn from_error(error: HttpError) -> Self {
        if error.is_transient() {
            Self::Retryable(error)
        } else {
            Self::Terminal(error)
        }
    }

    /// Classifies a received response.
    #[must_use]
    pub fn from_response(response: HttpResponse) -> Self {
        if response.is_success() {
            Self::Success(response)
        } else {
            Self::from_error(HttpError::status(
                response.status.as_u16(),
                response.status_text(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(100), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_outcome_classification() {
        let ok = AttemptOutcome::from_response(HttpResponse::new(StatusCode::OK, "{}"));
        let unavailable =
            AttemptOutcome::from_response(HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE, ""));
        let missing = AttemptOutcome::from_response(HttpResponse::new(StatusCode::NOT_FOUND, ""));

        assert!(matches!(ok, AttemptOutcome::Success(_)));
        assert!(matches!(unavailable, AttemptOutcome::Retryable(_)));
        assert!(matches!(
            missing,
            AttemptOutcome::Terminal(HttpError::Status { status: 404, .. })
        ));
    }
}
