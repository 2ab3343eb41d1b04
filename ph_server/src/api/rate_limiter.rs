//! Per-connection message rate limiting.
//!
//! Every WebSocket connection owns a [`MessageLimiter`] that combines a short
//! burst window with a longer sustained window. A frame is admitted only when
//! both windows have room.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Sliding-window counter over one time window
#[derive(Debug)]
pub struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindow {
    /// # Arguments
    ///
    /// * `max_requests` - Maximum number of requests allowed in the window
    /// * `window` - Window duration
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.max_requests
    }

    fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Time until the oldest request leaves the window.
    fn retry_after(&self, now: Instant) -> Duration {
        self.timestamps
            .front()
            .map_or(Duration::ZERO, |oldest| {
                self.window.saturating_sub(now.duration_since(*oldest))
            })
    }

    pub fn current_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Which window rejected a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWindow {
    Burst,
    Sustained,
}

impl LimitWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            LimitWindow::Burst => "burst",
            LimitWindow::Sustained => "sustained",
        }
    }
}

/// A rejected message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub window: LimitWindow,
    pub retry_after: Duration,
}

/// Burst plus sustained limiter for one connection
#[derive(Debug)]
pub struct MessageLimiter {
    burst: SlidingWindow,
    sustained: SlidingWindow,
}

impl MessageLimiter {
    /// Limiter with `burst_limit` messages per second and `sustained_limit`
    /// messages per minute.
    ///
    /// # Example
    ///
    /// ```
    /// use ph_server::{api::rate_limiter::MessageLimiter, config::RateLimitConfig};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut limiter = MessageLimiter::new(&RateLimitConfig {
    ///     burst_limit: 2,
    ///     sustained_limit: 10,
    /// });
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_err());
    /// # }
    /// ```
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            burst: SlidingWindow::new(config.burst_limit as usize, Duration::from_secs(1)),
            sustained: SlidingWindow::new(config.sustained_limit as usize, Duration::from_secs(60)),
        }
    }

    /// Admit one message, or report the window that is full.
    ///
    /// Rejected messages are not counted against either window.
    pub fn check(&mut self) -> Result<(), RateLimited> {
        let now = Instant::now();

        if !self.burst.has_room(now) {
            return Err(RateLimited {
                window: LimitWindow::Burst,
                retry_after: self.burst.retry_after(now),
            });
        }
        if !self.sustained.has_room(now) {
            return Err(RateLimited {
                window: LimitWindow::Sustained,
                retry_after: self.sustained.retry_after(now),
            });
        }

        self.burst.record(now);
        self.sustained.record(now);
        Ok(())
    }

    /// Messages admitted in the last minute.
    pub fn recent_count(&self) -> usize {
        self.sustained.current_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(burst_limit: u32, sustained_limit: u32) -> MessageLimiter {
        MessageLimiter::new(&RateLimitConfig {
            burst_limit,
            sustained_limit,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_allows_within_burst() {
        let mut limiter = limiter(5, 100);
        for _ in 0..5 {
            assert!(limiter.check().is_ok(), "Should allow requests within limit");
        }
        assert_eq!(limiter.recent_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_over_burst() {
        let mut limiter = limiter(3, 100);
        for _ in 0..3 {
            limiter.check().unwrap();
        }

        let err = limiter.check().unwrap_err();
        assert_eq!(err.window, LimitWindow::Burst);
        assert!(err.retry_after <= Duration::from_secs(1));
        assert_eq!(limiter.recent_count(), 3, "rejections are not counted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_window_expiry() {
        let mut limiter = limiter(2, 100);
        limiter.check().unwrap();
        limiter.check().unwrap();
        assert!(limiter.check().is_err());

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(limiter.check().is_ok(), "Should allow after window expires");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_limit() {
        let mut limiter = limiter(10, 25);
        for _ in 0..25 {
            if limiter.check().is_err() {
                tokio::time::advance(Duration::from_secs(1)).await;
                limiter.check().unwrap();
            }
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        let err = limiter.check().unwrap_err();
        assert_eq!(err.window, LimitWindow::Sustained);
        assert!(err.retry_after > Duration::ZERO);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_window_names() {
        assert_eq!(LimitWindow::Burst.as_str(), "burst");
        assert_eq!(LimitWindow::Sustained.as_str(), "sustained");
    }
}
