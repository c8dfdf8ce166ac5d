//! Harvester Core Library
//!
//! This library provides the core of the chapter harvester: it visits the
//! chapters of a paginated reader site one at a time in a shared rendered
//! page, extracts each chapter's image URLs, and downloads them into a
//! per-chapter folder in bounded concurrent windows.
//!
//! # Architecture
//!
//! Data flows strictly downward:
//! - [`runner`] - iterates chapter identifiers and collects the run report
//! - [`orchestrator`] - per-target retry/timeout state machine
//! - [`acquire`] - page acquisition contract and missing-chapter heuristics
//! - [`renderer`] - rendering session abstraction (Chromium behind a feature)
//! - [`download`] - windowed batches, per-asset retries, streaming HTTP client
//! - [`chapter`] - identifiers, selections and request targets
//! - [`config`] - TOML harvest profiles and component wiring

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod acquire;
pub mod chapter;
pub mod config;
pub mod cookies;
pub mod download;
pub mod orchestrator;
pub mod renderer;
pub mod runner;
#[cfg(test)]
pub(crate) mod test_support;
pub mod user_agent;

// Re-export commonly used types
pub use acquire::{AcquireError, AcquisitionResult, PageAcquirer, RenderedPageAcquirer};
pub use chapter::{ChapterIdentifier, ChapterNumber, ChapterResolver, ChapterTarget};
pub use config::{ConfigError, HarvestConfig};
pub use cookies::SessionCookies;
pub use download::{
    AssetFetcher, BatchDownloader, BatchReport, DownloadError, FetchOutcome, HttpClient,
    RetryDecision, RetryPolicy,
};
pub use orchestrator::{ChapterError, ChapterOrchestrator, ChapterOutcome, ChapterSettings};
pub use renderer::{RenderError, RenderSession};
pub use runner::{HarvestReport, HarvestRunner};
