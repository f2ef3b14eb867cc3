//! Retry policy for idempotent provider requests.

use rand::Rng;
use std::time::Duration;

/// HTTP statuses worth retrying: throttling and transient upstream faults.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Returns true if a response with this status should be retried.
#[inline]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Exponential backoff for transport-level retries.
///
/// ```rust
/// use walletwatch_provider::RetryPolicy;
///
/// let policy = RetryPolicy::default().without_jitter();
/// assert_eq!(policy.calculate_delay(1), 300);
/// assert_eq!(policy.calculate_delay(2), 600);
/// assert!(!policy.should_retry(4));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry in milliseconds (default: 300ms)
    initial_delay_ms: u64,
    /// Upper bound for any single delay (default: 10s)
    max_delay_ms: u64,
    /// Maximum number of retries after the first attempt (default: 3)
    max_retries: u32,
    /// Whether to add 0-25% jitter (default: true)
    jitter_enabled: bool,
}

impl RetryPolicy {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64, max_retries: u32) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
            max_retries,
            jitter_enabled: true,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Create a policy with jitter disabled (useful for testing).
    pub fn without_jitter(mut self) -> Self {
        self.jitter_enabled = false;
        self
    }

    pub fn initial_delay_ms(&self) -> u64 {
        self.initial_delay_ms
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay in milliseconds before retry number `attempt` (1-based).
    ///
    /// Doubles per attempt, capped at `max_delay_ms`.
    pub fn calculate_delay(&self, attempt: u32) -> u64 {
        // 2^8 = 256x is far past any sane cap
        let backoff_power = attempt.saturating_sub(1).min(8);
        let exponential = self.initial_delay_ms.saturating_mul(1 << backoff_power);
        let capped = exponential.min(self.max_delay_ms);

        if self.jitter_enabled && capped > 0 {
            let jitter = (capped as f64 * rand::thread_rng().gen::<f64>() * 0.25) as u64;
            capped + jitter
        } else {
            capped
        }
    }

    pub fn calculate_delay_duration(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.calculate_delay(attempt))
    }

    /// Returns `true` if `attempt <= max_retries`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 300,
            max_delay_ms: 10_000,
            max_retries: 3,
            jitter_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status), "{status} should retry");
        }
        for status in [200, 400, 401, 403, 404, 501] {
            assert!(!is_retryable_status(status), "{status} should not retry");
        }
    }

    #[test]
    fn test_exponential_delays_without_jitter() {
        let policy = RetryPolicy::new(100, 1_000, 5).without_jitter();
        assert_eq!(policy.calculate_delay(1), 100);
        assert_eq!(policy.calculate_delay(2), 200);
        assert_eq!(policy.calculate_delay(3), 400);
        assert_eq!(policy.calculate_delay(4), 800);
        assert_eq!(policy.calculate_delay(5), 1_000);
        assert_eq!(policy.calculate_delay(40), 1_000);
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let policy = RetryPolicy::new(1_000, 60_000, 3);
        for _ in 0..50 {
            let delay = policy.calculate_delay(1);
            assert!((1_000..=1_250).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn test_should_retry_bounds() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
        assert!(!RetryPolicy::none().should_retry(1));
    }
}
