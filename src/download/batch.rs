//! Windowed concurrent download of one chapter's ordered asset list.
//!
//! The list is cut into consecutive windows of at most `concurrency` URLs.
//! All transfers of a window run concurrently; the next window starts only
//! after every transfer of the current one has settled. Each asset is
//! written to `<folder>/<NNN><ext>` where `NNN` is its 1-based position in
//! the whole list, so failures never shift later indices.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{AssetFetcher, BatchDownloader, HttpClient, RetryPolicy};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = AssetFetcher::new(HttpClient::new(), RetryPolicy::default());
//! let downloader = BatchDownloader::new(fetcher, 10)?;
//! let urls = vec!["https://cdn.example.com/1.jpg".to_string()];
//! let report = downloader
//!     .run(&urls, Path::new("./Chap_001"), Some("https://example.com/chap-1"), None)
//!     .await;
//! println!("{} written, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::constants::{ALLOWED_EXTENSIONS, DEFAULT_EXTENSION};
use super::fetcher::{AssetFetcher, FetchOutcome};
use super::filename::{asset_extension, asset_file_name, normalize_asset_url};
use crate::cookies::SessionCookies;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default window size.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Error type for batch construction.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Outcome for a single asset of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDownloadOutcome {
    /// 1-based position in the chapter's asset list.
    pub index: usize,
    /// URL as extracted from the page.
    pub url: String,
    /// What happened.
    pub status: FetchOutcome,
}

/// Per-asset results of one chapter batch, in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<AssetDownloadOutcome>,
    windows: usize,
}

impl BatchReport {
    /// Outcomes ordered by index.
    #[must_use]
    pub fn outcomes(&self) -> &[AssetDownloadOutcome] {
        &self.outcomes
    }

    /// Number of windows the list was split into.
    #[must_use]
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Assets written to disk.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, FetchOutcome::Written { .. }))
    }

    /// Assets that exhausted their attempts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FetchOutcome::Failed { .. }))
    }

    /// Placeholder or inline-data entries that were ignored.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FetchOutcome::Skipped { .. }))
    }

    /// Total entries in the report.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Downloads an ordered asset list in fixed-size concurrent windows.
#[derive(Debug, Clone)]
pub struct BatchDownloader {
    fetcher: Arc<AssetFetcher>,
    concurrency: usize,
    allowed_extensions: Vec<String>,
    default_extension: String,
}

impl BatchDownloader {
    /// Creates a downloader with window size `concurrency`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug", skip(fetcher))]
    pub fn new(fetcher: AssetFetcher, concurrency: usize) -> Result<Self, BatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(BatchError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_attempts = fetcher.retry_policy().max_attempts(),
            "creating batch downloader"
        );

        Ok(Self {
            fetcher: Arc::new(fetcher),
            concurrency,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect(),
            default_extension: DEFAULT_EXTENSION.to_string(),
        })
    }

    /// Overrides the extension whitelist and its fallback.
    #[must_use]
    pub fn with_extensions(mut self, allowed: Vec<String>, default_extension: String) -> Self {
        self.allowed_extensions = allowed;
        self.default_extension = default_extension;
        self
    }

    /// Returns the configured window size.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// File name the asset at 1-based `index` will be written under.
    #[must_use]
    pub fn file_name_for(&self, index: usize, url: &str) -> String {
        let ext = asset_extension(
            &normalize_asset_url(url),
            &self.allowed_extensions,
            &self.default_extension,
        );
        asset_file_name(index, &ext)
    }

    /// Downloads every URL into `folder`, which must already exist.
    ///
    /// Individual failures never abort the batch; they're recorded in the
    /// returned report.
    #[instrument(skip(self, urls, cookies), fields(folder = %folder.display(), assets = urls.len()))]
    pub async fn run(
        &self,
        urls: &[String],
        folder: &Path,
        referer: Option<&str>,
        cookies: Option<&SessionCookies>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let referer = referer.map(ToString::to_string);
        let cookies = cookies.cloned().map(Arc::new);

        for (window_index, window) in urls.chunks(self.concurrency).enumerate() {
            let offset = window_index * self.concurrency;
            debug!(
                window = window_index + 1,
                size = window.len(),
                "starting window"
            );

            let mut handles = Vec::with_capacity(window.len());
            for (position, url) in window.iter().enumerate() {
                let index = offset + position + 1;
                let dest = folder.join(self.file_name_for(index, url));
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                let referer = referer.clone();
                let cookies = cookies.clone();

                handles.push((
                    index,
                    url.clone(),
                    tokio::spawn(async move {
                        fetcher
                            .fetch(&url, &dest, referer.as_deref(), cookies.as_deref())
                            .await
                    }),
                ));
            }

            for (index, url, handle) in handles {
                let status = match handle.await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(index, error = %e, "download task panicked");
                        FetchOutcome::Failed {
                            reason: format!("download task failed: {e}"),
                            attempts: 0,
                        }
                    }
                };
                report
                    .outcomes
                    .push(AssetDownloadOutcome { index, url, status });
            }
            report.windows += 1;
        }

        info!(
            written = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            windows = report.windows,
            "batch complete"
        );
        report
    }
}
