//! Per-venue REST rate limiting.
//!
//! Two limiting strategies are supported: a sliding window that tracks
//! the weight consumed by individual requests over a rolling interval
//! (used by weight/count/per-endpoint policies), and a continuously
//! refilling token bucket.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimiterError {
    #[error("no rate limit policy registered for exchange '{0}'")]
    UnknownExchange(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimitPolicy {
    Weight { limit: u32, window_secs: u64 },
    Count { limit: u32, window_secs: u64 },
    PerEndpoint { limit: u32, window_secs: u64 },
    TokenBucket { capacity: u32, refill_per_sec: f64 },
}

enum State {
    SlidingWindow {
        limit: u32,
        window: Duration,
        usage: VecDeque<(Instant, u32)>,
    },
    TokenBucket {
        capacity: f64,
        refill_per_sec: f64,
        tokens: f64,
        last_refill: Instant,
    },
}

/// Tracks request budget for a single venue. Cheap to clone via `Arc` at
/// the call site; internal state is behind a mutex since connectors call
/// it from multiple concurrent tasks.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    state: Mutex<State>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        let state = match policy {
            RateLimitPolicy::Weight { window_secs, .. }
            | RateLimitPolicy::Count { window_secs, .. }
            | RateLimitPolicy::PerEndpoint { window_secs, .. } => State::SlidingWindow {
                limit: match policy {
                    RateLimitPolicy::Weight { limit, .. }
                    | RateLimitPolicy::Count { limit, .. }
                    | RateLimitPolicy::PerEndpoint { limit, .. } => limit,
                    RateLimitPolicy::TokenBucket { .. } => unreachable!(),
                },
                window: Duration::from_secs(window_secs),
                usage: VecDeque::new(),
            },
            RateLimitPolicy::TokenBucket { capacity, refill_per_sec } => State::TokenBucket {
                capacity: f64::from(capacity),
                refill_per_sec,
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            },
        };
        Self { policy, state: Mutex::new(state) }
    }

    #[must_use]
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Units of budget currently available without waiting.
    #[must_use]
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        match &mut *state {
            State::SlidingWindow { limit, window, usage } => {
                prune(usage, *window);
                let used: u32 = usage.iter().map(|(_, w)| w).sum();
                f64::from(limit.saturating_sub(used))
            }
            State::TokenBucket { capacity, refill_per_sec, tokens, last_refill } => {
                refill(capacity, *refill_per_sec, tokens, last_refill);
                *tokens
            }
        }
    }

    /// How long the caller would need to wait before `weight` units are
    /// available. Zero if already available.
    #[must_use]
    pub fn wait_time(&self, weight: u32) -> Duration {
        let mut state = self.state.lock();
        match &mut *state {
            State::SlidingWindow { limit, window, usage } => {
                prune(usage, *window);
                let used: u32 = usage.iter().map(|(_, w)| w).sum();
                if used + weight <= *limit {
                    return Duration::ZERO;
                }
                match usage.front() {
                    Some((oldest, _)) => window.saturating_sub(oldest.elapsed()),
                    None => Duration::ZERO,
                }
            }
            State::TokenBucket { capacity, refill_per_sec, tokens, last_refill } => {
                refill(capacity, *refill_per_sec, tokens, last_refill);
                let deficit = f64::from(weight) - *tokens;
                if deficit <= 0.0 || *refill_per_sec <= 0.0 {
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(deficit / *refill_per_sec)
                }
            }
        }
    }

    /// Non-blocking attempt to consume `weight` units of budget.
    pub fn try_acquire(&self, weight: u32) -> bool {
        let mut state = self.state.lock();
        match &mut *state {
            State::SlidingWindow { limit, window, usage } => {
                prune(usage, *window);
                let used: u32 = usage.iter().map(|(_, w)| w).sum();
                if used + weight > *limit {
                    return false;
                }
                usage.push_back((Instant::now(), weight));
                true
            }
            State::TokenBucket { capacity, refill_per_sec, tokens, last_refill } => {
                refill(capacity, *refill_per_sec, tokens, last_refill);
                if *tokens < f64::from(weight) {
                    return false;
                }
                *tokens -= f64::from(weight);
                true
            }
        }
    }

    /// Waits, sleeping in a loop, until `weight` units can be consumed.
    pub async fn acquire(&self, weight: u32) {
        loop {
            if self.try_acquire(weight) {
                return;
            }
            let wait = self.wait_time(weight).max(Duration::from_millis(10));
            tokio::time::sleep(wait).await;
        }
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        match &mut *state {
            State::SlidingWindow { usage, .. } => usage.clear(),
            State::TokenBucket { capacity, tokens, last_refill, .. } => {
                *tokens = *capacity;
                *last_refill = Instant::now();
            }
        }
    }
}

fn prune(usage: &mut VecDeque<(Instant, u32)>, window: Duration) {
    while let Some((timestamp, _)) = usage.front() {
        if timestamp.elapsed() > window {
            usage.pop_front();
        } else {
            break;
        }
    }
}

fn refill(capacity: &f64, refill_per_sec: f64, tokens: &mut f64, last_refill: &mut Instant) {
    let elapsed = last_refill.elapsed().as_secs_f64();
    *tokens = (*tokens + elapsed * refill_per_sec).min(*capacity);
    *last_refill = Instant::now();
}

/// Builds rate limiters using the exact presets observed per venue, with
/// an optional per-venue override from configuration.
pub struct RateLimiterFactory;

impl RateLimiterFactory {
    #[allow(clippy::result_large_err)]
    pub fn create(
        exchange: &str,
        override_policy: Option<RateLimitPolicy>,
    ) -> Result<RateLimiter, RateLimiterError> {
        if let Some(policy) = override_policy {
            return Ok(RateLimiter::new(policy));
        }
        let policy = Self::default_policy(exchange)
            .ok_or_else(|| RateLimiterError::UnknownExchange(exchange.to_string()))?;
        Ok(RateLimiter::new(policy))
    }

    #[must_use]
    pub fn default_policy(exchange: &str) -> Option<RateLimitPolicy> {
        match exchange.to_lowercase().as_str() {
            "binance" => Some(RateLimitPolicy::Weight { limit: 1200, window_secs: 60 }),
            "bybit" => Some(RateLimitPolicy::Count { limit: 600, window_secs: 5 }),
            "okx" => Some(RateLimitPolicy::PerEndpoint { limit: 20, window_secs: 2 }),
            "kraken" => Some(RateLimitPolicy::TokenBucket { capacity: 15, refill_per_sec: 0.33 }),
            "upbit" => Some(RateLimitPolicy::Count { limit: 10, window_secs: 1 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_exchange_without_override_is_an_error() {
        assert!(RateLimiterFactory::create("dogecoin_dex", None).is_err());
    }

    #[test]
    fn known_presets_match_recorded_values() {
        assert_eq!(
            RateLimiterFactory::default_policy("binance"),
            Some(RateLimitPolicy::Weight { limit: 1200, window_secs: 60 })
        );
        assert_eq!(
            RateLimiterFactory::default_policy("kraken"),
            Some(RateLimitPolicy::TokenBucket { capacity: 15, refill_per_sec: 0.33 })
        );
    }

    #[test]
    fn sliding_window_blocks_once_exhausted() {
        let limiter = RateLimiter::new(RateLimitPolicy::Count { limit: 2, window_secs: 60 });
        assert!(limiter.try_acquire(1));
        assert!(limiter.try_acquire(1));
        assert!(!limiter.try_acquire(1));
    }

    #[test]
    fn token_bucket_rejects_when_insufficient() {
        let limiter =
            RateLimiter::new(RateLimitPolicy::TokenBucket { capacity: 5, refill_per_sec: 1.0 });
        assert!(limiter.try_acquire(5));
        assert!(!limiter.try_acquire(1));
    }

    #[test]
    fn reset_restores_full_budget() {
        let limiter = RateLimiter::new(RateLimitPolicy::Count { limit: 1, window_secs: 60 });
        assert!(limiter.try_acquire(1));
        limiter.reset();
        assert!(limiter.try_acquire(1));
    }
}
