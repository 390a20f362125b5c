use thiserror::Error;

use crate::config::ConfigError;
use crate::ratelimit::RateLimiterError;

/// Crate-wide error type. Mirrors the taxonomy: config errors are fatal at
/// startup; connection and rate-limit errors are recoverable at the
/// connector; insufficient balance and invalid-signal errors are caught by
/// the pipeline and counted rather than propagated.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rate limiter error: {0}")]
    RateLimiter(#[from] RateLimiterError),

    #[error("connection error on {exchange}: {reason}")]
    Connection { exchange: String, reason: String },

    #[error("rate limit wait timed out on {exchange} after {waited_ms}ms")]
    RateLimitTimeout { exchange: String, waited_ms: u64 },

    #[error("insufficient balance on {exchange} for {asset}: needed {needed}, available {available}")]
    InsufficientBalance {
        exchange: String,
        asset: String,
        needed: f64,
        available: f64,
    },

    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
