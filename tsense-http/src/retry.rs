//! Retry policy for transient failures.

use crate::HttpClientError;
use std::time::Duration;

/// Statuses the service returns while overloaded or restarting.
pub const RETRIABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

const MAX_DELAY: Duration = Duration::from_secs(30);

/// How often and how patiently a request is repeated.
///
/// Timeouts, refused connections and [`RETRIABLE_STATUS_CODES`] are retried.
/// The delay doubles after every attempt, up to 30 seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl RetryConfig {
    /// Retry with doubling delays starting at `initial_delay`.
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Retry straight away.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::exponential(max_attempts, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-indexed).
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Whether a response with this status is worth another attempt.
    pub fn retries_status(&self, status: u16) -> bool {
        RETRIABLE_STATUS_CODES.contains(&status)
    }

    /// Whether a transport failure is worth another attempt.
    pub fn retries_error(&self, error: &HttpClientError) -> bool {
        matches!(error, HttpClientError::Http(e) if e.is_timeout() || e.is_connect())
    }
}
