//! Sliding-window rate limiter.
//!
//! A bounded ring of recent send times behind a single mutator. The
//! wait-or-send decision is a pure function of buffer state and clock,
//! so the window property (never more than `calls` sends inside any
//! rolling `period`) is testable without real sleeping.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Max successful sends per rolling window.
    pub calls: usize,
    /// Window length.
    pub period: Duration,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    sent: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            sent: VecDeque::with_capacity(config.calls),
            config,
        }
    }

    /// How long a caller must wait before sending at `now`, if at all.
    /// Pure with respect to the buffer: does not record a send.
    pub fn wait_needed(&self, now: Instant) -> Option<Duration> {
        let in_window = self
            .sent
            .iter()
            .filter(|t| now.duration_since(**t) < self.config.period)
            .count();
        if in_window < self.config.calls {
            return None;
        }
        // Oldest in-window entry; the slot frees when it ages out.
        let oldest = self
            .sent
            .iter()
            .find(|t| now.duration_since(**t) < self.config.period)?;
        Some(self.config.period - now.duration_since(*oldest))
    }

    /// Block until a send slot is free, then record the send.
    pub async fn acquire(&mut self) {
        loop {
            let now = Instant::now();
            self.prune(now);
            match self.wait_needed(now) {
                None => {
                    self.sent.push_back(now);
                    return;
                }
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Record a send at `now` without waiting. Test-and-simulation hook;
    /// `acquire` is the production path.
    pub fn record(&mut self, now: Instant) {
        self.prune(now);
        self.sent.push_back(now);
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.sent.front() {
            if now.duration_since(*front) >= self.config.period {
                self.sent.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(calls: usize, period_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            calls,
            period: Duration::from_millis(period_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_calls_at_two_per_second_takes_two_seconds() {
        let mut limiter = RateLimiter::new(config(2, 1000));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        // Windows: sends 1-2 immediate, 3-4 at +1s, 5 at +2s.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "elapsed: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_never_exceeds_quota() {
        let cfg = config(3, 500);
        let mut limiter = RateLimiter::new(cfg);
        let mut sends: Vec<Instant> = Vec::new();

        for _ in 0..10 {
            limiter.acquire().await;
            sends.push(Instant::now());
        }

        for (i, send) in sends.iter().enumerate() {
            let in_window = sends[..=i]
                .iter()
                .filter(|t| send.duration_since(**t) < cfg.period)
                .count();
            assert!(in_window <= cfg.calls, "window overflow at send {i}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_needed_is_pure() {
        let mut limiter = RateLimiter::new(config(1, 1000));
        let now = Instant::now();
        limiter.record(now);

        // Asking twice does not consume anything.
        let first = limiter.wait_needed(now);
        let second = limiter.wait_needed(now);
        assert_eq!(first, second);
        assert_eq!(first, Some(Duration::from_millis(1000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slots_free_after_period() {
        let mut limiter = RateLimiter::new(config(2, 1000));
        let now = Instant::now();
        limiter.record(now);
        limiter.record(now);
        assert!(limiter.wait_needed(now).is_some());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(limiter.wait_needed(Instant::now()), None);
    }
}
