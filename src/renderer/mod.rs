//! Rendering session abstraction.
//!
//! A [`RenderSession`] is one long-lived browser page reused for every
//! chapter visit. Methods that change the page take `&mut self`, so a
//! session handle can only drive one navigation at a time.

#[cfg(feature = "chromium")]
pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a rendering session.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The browser could not be started.
    #[error("failed to launch browser: {reason}")]
    Launch {
        /// Launch failure detail.
        reason: String,
    },

    /// Loading a URL failed at the network or protocol level.
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// Requested URL.
        url: String,
        /// Failure detail.
        reason: String,
    },

    /// Loading a URL did not finish in time.
    #[error("navigation to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Requested URL.
        url: String,
        /// The limit that expired.
        timeout: Duration,
    },

    /// Page-context script failed or returned something unusable.
    #[error("page script failed: {reason}")]
    Script {
        /// Failure detail.
        reason: String,
    },

    /// The session could not report its state (URL, cookies).
    #[error("session query failed: {reason}")]
    Session {
        /// Failure detail.
        reason: String,
    },
}

impl RenderError {
    /// Creates a navigation error.
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a script error.
    pub fn script(reason: impl ToString) -> Self {
        Self::Script {
            reason: reason.to_string(),
        }
    }

    /// Creates a session query error.
    pub fn session(reason: impl ToString) -> Self {
        Self::Session {
            reason: reason.to_string(),
        }
    }
}

/// A single browser page that can load URLs and run page-context script.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Loads `url`, following the site's own redirects, and returns the
    /// resolved URL.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<String, RenderError>;

    /// Reloads the current page from scratch and returns the resolved URL.
    async fn reload(&mut self, timeout: Duration) -> Result<String, RenderError>;

    /// Returns the URL the page is currently showing.
    async fn current_url(&self) -> Result<String, RenderError>;

    /// Evaluates a script expression and returns its JSON value
    /// (`Null` for `undefined`).
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, RenderError>;

    /// Returns the session's cookies as name/value pairs.
    async fn cookies(&self) -> Result<Vec<(String, String)>, RenderError>;
}
