//! Asset transfer failures.
//!
//! Every variant names the asset URL or destination path, because the text
//! ends up verbatim in the per-asset `Failed` outcome of a batch report.

use std::path::PathBuf;

use thiserror::Error;

/// Why one request for one asset did not produce a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, DNS, TLS or body-stream failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Asset URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not finish within the per-asset limit.
    #[error("timed out fetching {url}")]
    Timeout {
        /// Asset URL.
        url: String,
    },

    /// The CDN answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// Asset URL.
        url: String,
        /// Response status.
        status: u16,
    },

    /// Creating or writing the destination file failed.
    #[error("cannot write {path}: {source}")]
    Io {
        /// Destination file.
        path: PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The asset URL does not parse.
    #[error("invalid asset URL: {url}")]
    InvalidUrl {
        /// Raw URL as extracted from the page.
        url: String,
    },

    /// A `Referer` or `Cookie` value contains bytes not allowed in headers.
    #[error("cannot encode {header} header for {url}")]
    InvalidHeader {
        /// Asset URL.
        url: String,
        /// Header name.
        header: &'static str,
    },
}

impl DownloadError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn invalid_header(url: impl Into<String>, header: &'static str) -> Self {
        Self::InvalidHeader {
            url: url.into(),
            header,
        }
    }

    /// HTTP status for [`DownloadError::HttpStatus`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
