//! Process-wide request pacing shared by every outbound client.
//!
//! A [`RateLimiter`] hands out evenly spaced slots: with a rate of `n` per
//! `interval`, consecutive acquisitions are at least `interval / n` apart.
//! It is cheap to share behind an [`Arc`](std::sync::Arc) and safe to call
//! from many tasks at once.

use std::fmt;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota};
use tracing::debug;

use crate::error::{LeadPipeError, Result};

/// GCRA limiter with a burst of one, so no two acquisitions share a slot.
pub struct RateLimiter {
    spacing: Duration,
    inner: DefaultDirectRateLimiter,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("spacing", &self.spacing)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Allow `rate` acquisitions per `interval`.
    pub fn new(rate: u32, interval: Duration) -> Result<Self> {
        if rate == 0 {
            return Err(LeadPipeError::config("rate limit must allow at least one request"));
        }

        let spacing = interval / rate;
        // `with_period` keeps the default burst size of one.
        let quota = Quota::with_period(spacing)
            .ok_or_else(|| LeadPipeError::config("rate limit interval must be non-zero"))?;

        Ok(Self {
            spacing,
            inner: governor::RateLimiter::direct(quota),
        })
    }

    /// Allow `rate` acquisitions per second.
    pub fn per_second(rate: u32) -> Result<Self> {
        Self::new(rate, Duration::from_secs(1))
    }

    /// Minimum gap between two consecutive acquisitions.
    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait for the next free slot.
    pub async fn acquire(&self) {
        if self.inner.check().is_ok() {
            return;
        }
        debug!(spacing_ms = self.spacing.as_millis() as u64, "rate limiting");
        self.inner.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn rejects_zero_rate() {
        let err = RateLimiter::per_second(0).unwrap_err();
        assert!(err.to_string().contains("at least one request"));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = RateLimiter::new(5, Duration::ZERO).unwrap_err();
        assert!(matches!(err, LeadPipeError::Config { .. }));
    }

    #[test]
    fn spacing_divides_interval() {
        let limiter = RateLimiter::per_second(5).unwrap();
        assert_eq!(limiter.spacing(), Duration::from_millis(200));

        let limiter = RateLimiter::new(3, Duration::from_millis(300)).unwrap();
        assert_eq!(limiter.spacing(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::per_second(1).unwrap();
        let start = std::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::per_second(20).unwrap();
        let start = std::time::Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        // (5 - 1) / 20 s
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn six_acquires_at_five_per_second_take_a_second() {
        let limiter = RateLimiter::per_second(5).unwrap();
        let start = std::time::Instant::now();
        for _ in 0..6 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn concurrent_acquires_share_the_budget() {
        let limiter = Arc::new(RateLimiter::per_second(20).unwrap());
        let start = std::time::Instant::now();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
