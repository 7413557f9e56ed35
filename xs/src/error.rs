//! Solver error types

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while solving an exercise
#[derive(Debug, Error)]
pub enum SolveError {
    /// Exercise could not be materialized (not found, locked, or gone)
    #[error("Exercise unavailable: {0}")]
    ExerciseUnavailable(String),

    /// Remote platform asked us to slow down
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Verification harness could not run (infrastructure, not test failures)
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Delivery channel rejected or failed the submission
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Interactive channel has no authenticated session
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Filesystem or subprocess I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation exceeded its timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Remote platform returned something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SolveError {
    /// Check if this error is a rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SolveError::RateLimited { .. })
    }

    /// Check if retrying the operation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SolveError::RateLimited { .. } | SolveError::Network(_) | SolveError::Timeout(_)
        )
    }

    /// Suggested wait before retrying, if the platform provided one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SolveError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
