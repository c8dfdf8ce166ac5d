//! Per-target retry/timeout state machine.
//!
//! Each attempt runs the whole acquisition sequence (navigate, missing
//! check, content wait, lazy load, extract, cookie snapshot) raced against
//! the chapter deadline. The attempt's [`CancellationToken`] is cancelled as
//! soon as the race settles, so work the losing branch left running sees
//! the cancellation and its late results are ignored.
//!
//! ```text
//! Pending -> Acquiring -> Succeeded
//!                      -> Skipped            (missing signal, never retried)
//!                      -> Retrying -> Acquiring
//!                      -> Failed             (attempts exhausted)
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::acquire::{AcquireError, AcquisitionResult, PageAcquirer, SessionCookies};
use crate::chapter::ChapterTarget;
use crate::download::{BatchDownloader, BatchReport, RetryDecision, RetryPolicy};

/// Why a single attempt did not produce an [`AcquisitionResult`].
#[derive(Debug, Error)]
pub enum ChapterError {
    /// The page resolved somewhere that means "no such chapter". Terminal.
    #[error("chapter missing (resolved to {final_url})")]
    MissingChapter {
        /// Where navigation ended up.
        final_url: String,
    },

    /// Navigation, content wait, empty extraction or session failure.
    #[error("transient acquisition failure: {source}")]
    TransientAcquisitionFailure {
        /// Underlying acquisition error.
        #[from]
        source: AcquireError,
    },

    /// The attempt did not finish before the chapter deadline.
    #[error("attempt timed out after {}ms", .timeout.as_millis())]
    ChapterTimeout {
        /// The deadline that expired.
        timeout: Duration,
    },
}

impl ChapterError {
    /// True for the terminal missing-chapter signal.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingChapter { .. })
    }
}

/// Lifecycle of one target, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    /// Not started.
    Pending,
    /// Running attempt `n`.
    Acquiring(u32),
    /// Waiting to start attempt `n`.
    Retrying(u32),
    /// Acquired; assets handed to the downloader.
    Succeeded,
    /// Missing signal seen.
    Skipped,
    /// Attempts exhausted.
    Failed,
}

impl fmt::Display for ChapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Acquiring(n) => write!(f, "acquiring (attempt {n})"),
            Self::Retrying(n) => write!(f, "retrying (attempt {n})"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Final classification of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// Assets were downloaded (some may have failed individually).
    Downloaded {
        /// Chapter folder.
        folder: PathBuf,
        /// Per-asset results.
        report: BatchReport,
        /// Attempts used to acquire the page.
        attempts: u32,
    },
    /// The chapter does not exist.
    SkippedMissing {
        /// Where navigation ended up.
        final_url: String,
    },
    /// Every attempt failed.
    FailedExhausted {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        last_error: String,
    },
}

impl ChapterOutcome {
    /// Stable log label: `downloaded`, `skipped_missing` or `failed_exhausted`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded { .. } => "downloaded",
            Self::SkippedMissing { .. } => "skipped_missing",
            Self::FailedExhausted { .. } => "failed_exhausted",
        }
    }

    /// True for [`ChapterOutcome::Downloaded`].
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    /// True for [`ChapterOutcome::SkippedMissing`].
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedMissing { .. })
    }

    /// True for [`ChapterOutcome::FailedExhausted`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::FailedExhausted { .. })
    }
}

impl fmt::Display for ChapterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded { report, .. } => write!(
                f,
                "downloaded with {} assets ({} failed)",
                report.succeeded(),
                report.failed()
            ),
            Self::SkippedMissing { .. } => f.write_str("skipped-missing"),
            Self::FailedExhausted { .. } => f.write_str("failed-exhausted"),
        }
    }
}

/// Knobs for the per-target state machine.
#[derive(Debug, Clone)]
pub struct ChapterSettings {
    /// Attempts per target, including the first.
    pub max_attempts: u32,
    /// Deadline for one whole attempt.
    pub timeout: Duration,
    /// Pause before reloading for the next attempt.
    pub retry_delay: Duration,
    /// Selector awaited before extraction; `None` skips the wait.
    pub content_selector: Option<String>,
    /// How long to await `content_selector`.
    pub content_timeout: Duration,
    /// Selector of asset elements.
    pub asset_selector: String,
    /// Capture session cookies and send them with asset requests.
    pub forward_cookies: bool,
    /// Send the chapter's resolved URL as `Referer`.
    pub send_referer: bool,
    /// Chapter folders are created under this directory.
    pub output_root: PathBuf,
}

impl Default for ChapterSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(60),
            retry_delay: Duration::from_millis(2000),
            content_selector: None,
            content_timeout: Duration::from_secs(15),
            asset_selector: "img".to_string(),
            forward_cookies: false,
            send_referer: true,
            output_root: PathBuf::from("downloads"),
        }
    }
}

/// Drives one [`ChapterTarget`] to a [`ChapterOutcome`].
#[derive(Debug, Clone)]
pub struct ChapterOrchestrator {
    settings: ChapterSettings,
    downloader: BatchDownloader,
    retry_policy: RetryPolicy,
}

impl ChapterOrchestrator {
    /// Creates an orchestrator handing acquired pages to `downloader`.
    #[must_use]
    pub fn new(settings: ChapterSettings, downloader: BatchDownloader) -> Self {
        let retry_policy = RetryPolicy::new(settings.max_attempts, settings.retry_delay);
        Self {
            settings,
            downloader,
            retry_policy,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &ChapterSettings {
        &self.settings
    }

    /// Processes one target on the shared page. Never fails: every error is
    /// turned into an outcome.
    #[instrument(skip(self, acquirer, target), fields(target = %target, url = %target.request_url))]
    pub async fn process<A>(&self, acquirer: &mut A, target: &ChapterTarget) -> ChapterOutcome
    where
        A: PageAcquirer + ?Sized,
    {
        let mut state = ChapterState::Pending;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            transition(&mut state, ChapterState::Acquiring(attempt));

            let cancel = CancellationToken::new();
            let result = tokio::select! {
                biased;
                result = self.acquire_once(acquirer, target, &cancel) => result,
                () = tokio::time::sleep(self.settings.timeout) => Err(ChapterError::ChapterTimeout {
                    timeout: self.settings.timeout,
                }),
            };
            cancel.cancel();

            let error = match result {
                Ok(acquisition) => {
                    transition(&mut state, ChapterState::Succeeded);
                    return self.deliver(target, acquisition, attempt).await;
                }
                Err(ChapterError::MissingChapter { final_url }) => {
                    transition(&mut state, ChapterState::Skipped);
                    log_missing(target, &final_url);
                    return ChapterOutcome::SkippedMissing { final_url };
                }
                Err(error) => error,
            };

            match self.retry_policy.should_retry(attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(attempt, error = %error, delay_ms = delay.as_millis(), "chapter attempt failed, retrying");
                    transition(&mut state, ChapterState::Retrying(next_attempt));
                    tokio::time::sleep(delay).await;
                    if let Err(e) = acquirer.reload().await {
                        debug!(error = %e, "reload before retry failed");
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    transition(&mut state, ChapterState::Failed);
                    warn!(
                        outcome = "failed_exhausted",
                        attempts = attempt,
                        error = %error,
                        %reason,
                        "chapter failed"
                    );
                    return ChapterOutcome::FailedExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    };
                }
            }
        }
    }

    async fn acquire_once<A>(
        &self,
        acquirer: &mut A,
        target: &ChapterTarget,
        cancel: &CancellationToken,
    ) -> Result<AcquisitionResult, ChapterError>
    where
        A: PageAcquirer + ?Sized,
    {
        let final_url = acquirer.navigate(&target.request_url, cancel).await?;
        debug!(final_url = %final_url, "navigated");
        if acquirer.is_missing_signal(&final_url, target) {
            return Err(ChapterError::MissingChapter { final_url });
        }

        if let Some(selector) = &self.settings.content_selector
            && let Err(e) = acquirer
                .wait_for_content_ready(selector, self.settings.content_timeout)
                .await
        {
            // Some sources redirect to the landing page only after load.
            if let Ok(current) = acquirer.current_url().await
                && acquirer.is_missing_signal(&current, target)
            {
                return Err(ChapterError::MissingChapter { final_url: current });
            }
            return Err(e.into());
        }

        acquirer.trigger_lazy_load(cancel).await;
        let asset_urls = acquirer
            .extract_asset_urls(&self.settings.asset_selector)
            .await?;

        let session_cookies = if self.settings.forward_cookies {
            acquirer.current_cookies().await?
        } else {
            SessionCookies::new()
        };

        Ok(AcquisitionResult {
            final_url,
            asset_urls,
            session_cookies,
        })
    }

    async fn deliver(
        &self,
        target: &ChapterTarget,
        acquisition: AcquisitionResult,
        attempts: u32,
    ) -> ChapterOutcome {
        let folder = self.settings.output_root.join(&target.folder_name);
        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            let last_error = format!("cannot create folder {}: {e}", folder.display());
            warn!(outcome = "failed_exhausted", attempts, error = %last_error, "chapter failed");
            return ChapterOutcome::FailedExhausted {
                attempts,
                last_error,
            };
        }

        let referer = self
            .settings
            .send_referer
            .then_some(acquisition.final_url.as_str());
        let cookies = (!acquisition.session_cookies.is_empty())
            .then_some(&acquisition.session_cookies);

        let report = self
            .downloader
            .run(&acquisition.asset_urls, &folder, referer, cookies)
            .await;

        info!(
            outcome = "downloaded",
            folder = %folder.display(),
            assets = report.succeeded(),
            failed = report.failed(),
            attempts,
            "chapter downloaded"
        );
        ChapterOutcome::Downloaded {
            folder,
            report,
            attempts,
        }
    }
}

fn transition(state: &mut ChapterState, next: ChapterState) {
    debug!(from = %state, to = %next, "chapter state");
    *state = next;
}

fn log_missing(target: &ChapterTarget, final_url: &str) {
    if target.identifier.is_slug() {
        warn!(outcome = "skipped_missing", final_url, "requested chapter does not exist");
    } else if target.is_base() {
        info!(outcome = "skipped_missing", final_url, "chapter does not exist");
    } else {
        debug!(outcome = "skipped_missing", final_url, "suffix variant not present");
    }
}
