//! Single-asset transfer with a bounded number of attempts.
//!
//! [`AssetFetcher::fetch`] never returns an error: exhausting the retry
//! budget yields [`FetchOutcome::Failed`] so one broken image can't abort
//! its batch. Placeholder and inline-data URLs are recognized up front and
//! reported as [`FetchOutcome::Skipped`] without touching the network.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use super::HttpClient;
use super::constants::PLACEHOLDER_PATTERNS;
use super::filename::{is_inline_data, is_placeholder, normalize_asset_url};
use super::retry::{RetryDecision, RetryPolicy};
use crate::cookies::SessionCookies;

/// Result of fetching one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Bytes were streamed to `path`.
    Written {
        /// Destination file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
        /// Attempts used (1 when the first try succeeded).
        attempts: u32,
    },
    /// Nothing to fetch: placeholder, spinner, inline data or empty URL.
    Skipped {
        /// Why the URL was ignored.
        reason: String,
    },
    /// Every attempt failed.
    Failed {
        /// Last error message.
        reason: String,
        /// Attempts made.
        attempts: u32,
    },
}

impl FetchOutcome {
    /// True for `Written` and `Skipped`; a skipped placeholder is an
    /// expected artifact of lazy-load markup, not a failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Downloads one asset to an exact path, retrying with a fixed pause.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: HttpClient,
    retry_policy: RetryPolicy,
    placeholder_patterns: Vec<String>,
}

impl AssetFetcher {
    /// Creates a fetcher with the default placeholder patterns.
    #[must_use]
    pub fn new(client: HttpClient, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            retry_policy,
            placeholder_patterns: PLACEHOLDER_PATTERNS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replaces the placeholder URL fragments.
    #[must_use]
    pub fn with_placeholder_patterns(mut self, patterns: Vec<String>) -> Self {
        self.placeholder_patterns = patterns;
        self
    }

    /// Returns the per-asset retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the reason `url` is not worth requesting, if any.
    #[must_use]
    pub fn skip_reason(&self, url: &str) -> Option<&'static str> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            Some("empty URL")
        } else if is_inline_data(trimmed) {
            Some("inline data URL")
        } else if is_placeholder(trimmed, &self.placeholder_patterns) {
            Some("placeholder image")
        } else {
            None
        }
    }

    /// Fetches `url` into `dest`, making at most `max_attempts` requests.
    #[instrument(skip(self, cookies), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        referer: Option<&str>,
        cookies: Option<&SessionCookies>,
    ) -> FetchOutcome {
        if let Some(reason) = self.skip_reason(url) {
            debug!(%reason, "skipping asset");
            return FetchOutcome::Skipped {
                reason: reason.to_string(),
            };
        }

        let url = normalize_asset_url(url);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting asset download");

            match self
                .client
                .download_to_path(&url, dest, referer, cookies)
                .await
            {
                Ok(bytes) => {
                    return FetchOutcome::Written {
                        path: dest.to_path_buf(),
                        bytes,
                        attempts: attempt,
                    };
                }
                Err(e) => match self.retry_policy.should_retry(attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        debug!(
                            attempt = next_attempt,
                            max_attempts = self.retry_policy.max_attempts(),
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "retrying asset"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        warn!(
                            url = %url,
                            attempts = attempt,
                            error = %e,
                            %reason,
                            "asset dropped after all attempts"
                        );
                        return FetchOutcome::Failed {
                            reason: e.to_string(),
                            attempts: attempt,
                        };
                    }
                },
            }
        }
    }
}
