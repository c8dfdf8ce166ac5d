//! Asset download layer: streaming HTTP client, per-asset retries, and
//! windowed batches.
//!
//! # Features
//!
//! - Streaming downloads written straight to the chapter folder
//! - Browser-equivalent User-Agent with optional `Referer` and `Cookie`
//! - Fixed-delay retries with a hard attempt ceiling
//! - Placeholder and inline-data filtering
//! - Index-based file naming (`001.jpg`) with an extension whitelist
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! client
//!     .download_to_path("https://cdn.example.com/1.jpg", Path::new("./001.jpg"), None, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
pub mod constants;
mod error;
mod fetcher;
pub mod filename;
mod retry;

pub use batch::{
    AssetDownloadOutcome, BatchDownloader, BatchError, BatchReport, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use client::HttpClient;
pub use error::DownloadError;
pub use fetcher::{AssetFetcher, FetchOutcome};
pub use retry::{RetryDecision, RetryPolicy};
