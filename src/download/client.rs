//! HTTP client wrapper for streaming assets to disk.
//!
//! This module provides the `HttpClient` struct which performs one streaming
//! transfer per call, with browser-equivalent headers and the optional
//! `Referer` / `Cookie` passthrough that image hosts use to authorize delivery.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderValue, REFERER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{ASSET_TIMEOUT_SECS, CONNECT_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::cookies::SessionCookies;
use crate::user_agent::BROWSER_USER_AGENT;

/// HTTP client for downloading assets with streaming support.
///
/// Created once per run and cloned into every download task; clones share
/// the underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client
///     .download_to_path(
///         "https://cdn.example.com/chap-1/001.jpg",
///         Path::new("./Chap_001/001.jpg"),
///         Some("https://example.com/chap-1.html"),
///         None,
///     )
///     .await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the browser User-Agent and default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 10 seconds
    /// - Whole-request timeout: 20 seconds
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_settings(
            BROWSER_USER_AGENT,
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(ASSET_TIMEOUT_SECS),
        )
        .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with an explicit User-Agent and timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error (e.g. TLS backend initialization).
    pub fn with_settings(
        user_agent: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Streams one URL to `dest`, creating or truncating the file.
    ///
    /// `referer` is sent as the `Referer` header and `cookies`, when present
    /// and non-empty, as a single `Cookie` header. A partially written file
    /// is removed when the transfer fails midway.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self, cookies), fields(url = %url, dest = %dest.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        dest: &Path,
        referer: Option<&str>,
        cookies: Option<&SessionCookies>,
    ) -> Result<u64, DownloadError> {
        debug!("starting download");

        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if let Some(referer) = referer.filter(|r| !r.is_empty()) {
            let value = HeaderValue::from_str(referer)
                .map_err(|_| DownloadError::invalid_header(url, "Referer"))?;
            request = request.header(REFERER, value);
        }
        if let Some(cookie_header) = cookies.and_then(SessionCookies::to_header_value) {
            let value = HeaderValue::from_str(&cookie_header)
                .map_err(|_| DownloadError::invalid_header(url, "Cookie"))?;
            request = request.header(COOKIE, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let stream_result = stream_to_file(&mut file, response, url, dest).await;
        if stream_result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes_written = stream_result?;

        debug!(bytes = bytes_written, "download complete");
        Ok(bytes_written)
    }
}

/// Streams the response body into `file`, returning bytes written. The
/// caller owns cleanup of the partial file.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_download_to_path_writes_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/chap-1/001.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/chap-1/001.jpg", mock_server.uri());
        let dest = temp_dir.path().join("001.jpg");

        let bytes = client.download_to_path(&url, &dest, None, None).await.unwrap();

        assert_eq!(bytes, 10);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_download_to_path_sends_referer_and_cookie() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/protected.png"))
            .and(header("referer", "https://reader.example.com/chap-7"))
            .and(header("cookie", "sid=42; theme=dark"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cookies: SessionCookies = [("theme", "dark"), ("sid", "42")].into_iter().collect();
        let client = HttpClient::new();
        let url = format!("{}/protected.png", mock_server.uri());
        let dest = temp_dir.path().join("001.png");

        let result = client
            .download_to_path(
                &url,
                &dest,
                Some("https://reader.example.com/chap-7"),
                Some(&cookies),
            )
            .await;

        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
    }

    #[tokio::test]
    async fn test_download_to_path_http_error_writes_nothing() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/gone.jpg", mock_server.uri());
        let dest = temp_dir.path().join("001.jpg");

        let result = client.download_to_path(&url, &dest, None, None).await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_to_path_rejects_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new();

        let result = client
            .download_to_path("not a url", &temp_dir.path().join("x.jpg"), None, None)
            .await;

        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_download_to_path_overwrites_existing_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("001.jpg");
        std::fs::write(&dest, b"old contents that are longer").unwrap();

        Mock::given(method("GET"))
            .and(path("/001.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/001.jpg", mock_server.uri());
        client.download_to_path(&url, &dest, None, None).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }
}
