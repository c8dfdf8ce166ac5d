//! Page acquisition: what the chapter state machine needs from a rendered page.
//!
//! [`PageAcquirer`] is the contract the orchestrator drives; it is
//! implemented over any [`RenderSession`](crate::renderer::RenderSession) by
//! [`RenderedPageAcquirer`], and by scripted fakes in tests.

pub mod missing;
mod page;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use crate::cookies::SessionCookies;
use crate::chapter::ChapterTarget;
use crate::renderer::RenderError;

pub use missing::{
    AnyOf, ExpectedSlugDetector, LandingPageDetector, MissingChapterDetector, PathMarkerDetector,
};
pub use page::{LazyLoadSettings, RenderedPageAcquirer, pick_asset_source, resolve_asset_url};

/// Everything a successful chapter visit produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionResult {
    /// URL the page resolved to; used as the asset `Referer`.
    pub final_url: String,
    /// Asset URLs in page order; position is the on-disk index.
    pub asset_urls: Vec<String>,
    /// Session cookies, captured only when forwarding is enabled.
    pub session_cookies: SessionCookies,
}

/// Transient acquisition failures. All of them are retried.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Loading the chapter page failed.
    #[error("navigation failed: {source}")]
    Navigation {
        /// Underlying session error.
        #[source]
        source: RenderError,
    },

    /// The content container never appeared.
    #[error("content '{selector}' not ready after {}ms", .timeout.as_millis())]
    ContentTimeout {
        /// Selector that was awaited.
        selector: String,
        /// How long it was awaited.
        timeout: Duration,
    },

    /// The page rendered but the asset selector matched nothing usable.
    #[error("no assets found for '{selector}'")]
    NoAssetsFound {
        /// Asset selector.
        selector: String,
    },

    /// Page script or session query failed.
    #[error("page session error: {source}")]
    Session {
        /// Underlying session error.
        #[source]
        source: RenderError,
    },

    /// The attempt was abandoned by the chapter deadline.
    #[error("acquisition cancelled")]
    Cancelled,
}

impl AcquireError {
    /// Wraps a session error raised while loading a page.
    #[must_use]
    pub fn navigation(source: RenderError) -> Self {
        Self::Navigation { source }
    }

    /// Wraps a session error raised while querying the page.
    #[must_use]
    pub fn session(source: RenderError) -> Self {
        Self::Session { source }
    }
}

/// Operations the chapter state machine performs on the shared page.
///
/// Methods take `&mut self`: one acquirer drives one navigation at a time.
/// `cancel` is cancelled when the attempt's deadline expires; work still in
/// flight at that point must not publish results.
#[async_trait]
pub trait PageAcquirer: Send {
    /// Loads `url` and returns the resolved URL.
    async fn navigate(&mut self, url: &str, cancel: &CancellationToken)
    -> Result<String, AcquireError>;

    /// True when `final_url` means `target` does not exist. Terminal.
    fn is_missing_signal(&self, final_url: &str, target: &ChapterTarget) -> bool;

    /// URL the page currently shows (late client-side redirects included).
    async fn current_url(&mut self) -> Result<String, AcquireError>;

    /// Waits until `selector` matches an element.
    async fn wait_for_content_ready(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), AcquireError>;

    /// Scrolls progressively so deferred sources populate. Best effort.
    async fn trigger_lazy_load(&mut self, cancel: &CancellationToken);

    /// Reads asset URLs for `selector` in document order.
    async fn extract_asset_urls(&mut self, selector: &str) -> Result<Vec<String>, AcquireError>;

    /// Snapshot of the session cookie jar.
    async fn current_cookies(&mut self) -> Result<SessionCookies, AcquireError>;

    /// Reloads the page before a retry.
    async fn reload(&mut self) -> Result<(), AcquireError>;
}
