//! Sliding-window send limiter.
//!
//! This is a runaway-loop detector rather than a traffic shaper. A bot that
//! answers its own messages sends without bound; once the last
//! `message_limit` sends all fit inside `interval_limit`, the limiter
//! refuses and the caller must stop the bot instead of retrying.
//!
//! ```rust,ignore
//! let mut limiter = RateLimiter::default(); // 20 messages per 5 seconds
//! if !limiter.check_and_record() {
//!     // fatal: shut the bot down
//! }
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::trace;

/// Sliding-window admission check for outbound sends.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    message_limit: usize,
    interval_limit: Duration,
    /// Send timestamps, oldest first.
    window: VecDeque<Instant>,
}

impl RateLimiter {
    /// Default number of sends kept in the window.
    pub const DEFAULT_MESSAGE_LIMIT: usize = 20;

    /// Default minimum span of a full window.
    pub const DEFAULT_INTERVAL_LIMIT: Duration = Duration::from_secs(5);

    /// Creates a limiter that allows `message_limit` sends per
    /// `interval_limit`.
    ///
    /// A `message_limit` of zero is treated as one.
    pub fn new(message_limit: usize, interval_limit: Duration) -> Self {
        let message_limit = message_limit.max(1);
        Self {
            message_limit,
            interval_limit,
            window: VecDeque::with_capacity(message_limit + 1),
        }
    }

    /// Returns the configured window size.
    pub fn message_limit(&self) -> usize {
        self.message_limit
    }

    /// Returns the configured minimum window span.
    pub fn interval_limit(&self) -> Duration {
        self.interval_limit
    }

    /// Number of timestamps currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Records a send happening now and reports whether it is allowed.
    pub fn check_and_record(&mut self) -> bool {
        self.check_and_record_at(Instant::now())
    }

    /// Records a send at `now` and reports whether it is allowed.
    ///
    /// Timestamps must be passed in non-decreasing order.
    pub fn check_and_record_at(&mut self, now: Instant) -> bool {
        self.window.push_back(now);
        if self.window.len() <= self.message_limit {
            return true;
        }

        self.window.pop_front();
        let (Some(oldest), Some(newest)) = (self.window.front(), self.window.back()) else {
            return true;
        };
        let elapsed = newest.saturating_duration_since(*oldest);
        trace!(
            elapsed_ms = elapsed.as_millis() as u64,
            limit_ms = self.interval_limit.as_millis() as u64,
            "Rate window full"
        );
        elapsed >= self.interval_limit
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MESSAGE_LIMIT, Self::DEFAULT_INTERVAL_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(base: Instant, s: u64) -> Instant {
        base + Duration::from_secs(s)
    }

    #[test]
    fn test_first_n_calls_always_allowed() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check_and_record_at(now));
        }
        assert_eq!(limiter.len(), 5);
    }

    #[test]
    fn test_burst_is_denied_once_window_is_full() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(5));
        let base = Instant::now();
        assert!(limiter.check_and_record_at(secs(base, 0)));
        assert!(limiter.check_and_record_at(secs(base, 1)));
        assert!(limiter.check_and_record_at(secs(base, 2)));
        // window after eviction: [1, 2, 3] spans 2s
        assert!(!limiter.check_and_record_at(secs(base, 3)));
    }

    #[test]
    fn test_slow_sender_is_allowed() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(5));
        let base = Instant::now();
        for (i, t) in [0, 1, 2, 6, 8, 11].into_iter().enumerate() {
            assert!(
                limiter.check_and_record_at(secs(base, t)),
                "send #{i} at {t}s should pass"
            );
        }
    }

    #[test]
    fn test_span_is_measured_over_trimmed_window() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(5));
        let base = Instant::now();
        assert!(limiter.check_and_record_at(secs(base, 0)));
        assert!(limiter.check_and_record_at(secs(base, 10)));
        assert!(limiter.check_and_record_at(secs(base, 11)));
        // the send at 0s is evicted before measuring: [10, 11, 12] spans 2s
        assert!(!limiter.check_and_record_at(secs(base, 12)));
    }

    #[test]
    fn test_span_equal_to_limit_is_allowed() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(5));
        let base = Instant::now();
        assert!(limiter.check_and_record_at(secs(base, 0)));
        assert!(limiter.check_and_record_at(secs(base, 1)));
        assert!(limiter.check_and_record_at(secs(base, 6)));
    }

    #[test]
    fn test_window_never_exceeds_limit() {
        let mut limiter = RateLimiter::new(4, Duration::from_secs(1));
        let base = Instant::now();
        for t in 0..50 {
            limiter.check_and_record_at(secs(base, t));
            assert!(limiter.len() <= 4);
        }
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.message_limit(), 1);
    }

    #[test]
    fn test_defaults() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.message_limit(), 20);
        assert_eq!(limiter.interval_limit(), Duration::from_secs(5));
        assert!(limiter.is_empty());
    }
}
