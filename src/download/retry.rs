//! Fixed-delay attempt budgets.
//!
//! Shared by asset transfers ([`super::AssetFetcher`]) and chapter attempts
//! (the orchestrator). `max_attempts` counts the first try; attempt
//! `max_attempts + 1` is never granted. The pause is the same before every
//! retry: sources are visited one chapter at a time, so there is nothing to
//! spread out.
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(2, Duration::from_secs(2));
//! assert!(matches!(policy.should_retry(1), RetryDecision::Retry { attempt: 2, .. }));
//! assert!(matches!(policy.should_retry(2), RetryDecision::DoNotRetry { .. }));
//! ```

use std::time::Duration;

use tracing::trace;

use super::constants::{ASSET_RETRY_DELAY, DEFAULT_ASSET_ATTEMPTS};

/// What to do after attempt `n` failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep `delay`, then make attempt number `attempt`.
    Retry {
        /// Pause before the next attempt.
        delay: Duration,
        /// Number of the next attempt (2 for the first retry).
        attempt: u32,
    },

    /// The budget is spent.
    DoNotRetry {
        /// Logged alongside the last error.
        reason: String,
    },
}

/// Attempt ceiling plus the pause between attempts. Defaults to the asset
/// budget: 3 attempts, 1.5 s apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ATTEMPTS, ASSET_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy; a zero ceiling is raised to one attempt.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides after the 1-based attempt `failed_attempt` failed.
    #[must_use]
    pub fn should_retry(&self, failed_attempt: u32) -> RetryDecision {
        if failed_attempt >= self.max_attempts {
            trace!(failed_attempt, max_attempts = self.max_attempts, "attempt budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("all {} attempts used", self.max_attempts),
            };
        }
        RetryDecision::Retry {
            delay: self.delay,
            attempt: failed_attempt + 1,
        }
    }
}
