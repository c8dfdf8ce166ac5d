//! Chromium-backed rendering session using chromiumoxide.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use super::{RenderError, RenderSession};
use crate::user_agent::BROWSER_USER_AGENT;

/// Environment variable that points at a Chromium/Chrome binary.
pub const CHROMIUM_PATH_ENV: &str = "HARVESTER_CHROMIUM_PATH";

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit browser binary; discovered when `None`.
    pub executable: Option<PathBuf>,
    /// Run without a window.
    pub headless: bool,
    /// User-Agent presented by the page.
    pub user_agent: String,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Finds a Chromium binary via [`CHROMIUM_PATH_ENV`], then the system PATH.
#[must_use]
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

/// One browser with one page, reused for every chapter visit.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Starts the browser and opens the shared page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] if the browser cannot be found,
    /// started, or cannot open a page.
    #[instrument(skip(options), fields(headless = options.headless))]
    pub async fn launch(options: &LaunchOptions) -> Result<Self, RenderError> {
        let launch_err = |reason: String| RenderError::Launch { reason };

        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", options.user_agent))
            .window_size(1366, 768);
        if let Some(path) = options.executable.clone().or_else(find_chromium) {
            debug!(path = %path.display(), "using browser binary");
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| launch_err(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| launch_err(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| launch_err(format!("failed to open page: {e}")))?;

        info!("browser ready");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Closes the browser and stops its event handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!(error = %e, "browser close reported an error");
        }
        self.handler.abort();
    }

    async fn resolved_url(&self, fallback: &str) -> String {
        match self.page.url().await {
            Ok(Some(url)) => url,
            _ => fallback.to_string(),
        }
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<String, RenderError> {
        load_within(
            url,
            timeout,
            async { self.page.goto(url).await.map(|_| ()) },
            async { self.page.wait_for_navigation().await.map(|_| ()) },
        )
        .await?;
        Ok(self.resolved_url(url).await)
    }

    async fn reload(&mut self, timeout: Duration) -> Result<String, RenderError> {
        let current = self.resolved_url("about:blank").await;
        match tokio::time::timeout(timeout, self.page.reload()).await {
            Ok(Ok(_)) => Ok(self.resolved_url(&current).await),
            Ok(Err(e)) => Err(RenderError::navigation(current, e)),
            Err(_) => Err(RenderError::Timeout {
                url: current,
                timeout,
            }),
        }
    }

    async fn current_url(&self) -> Result<String, RenderError> {
        self.page
            .url()
            .await
            .map_err(RenderError::session)
            .map(Option::unwrap_or_default)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, RenderError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(RenderError::script)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn cookies(&self) -> Result<Vec<(String, String)>, RenderError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(RenderError::session)?;
        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }
}

/// Runs `load`, then `settle`, both under one `timeout`. Client-side
/// redirects land during `settle`; its failure is logged, not returned.
async fn load_within<L, S, LE, SE>(
    url: &str,
    timeout: Duration,
    load: L,
    settle: S,
) -> Result<(), RenderError>
where
    L: Future<Output = Result<(), LE>>,
    S: Future<Output = Result<(), SE>>,
    LE: std::fmt::Display,
    SE: std::fmt::Display,
{
    let navigation = async {
        load.await.map_err(|e| RenderError::navigation(url, e))?;
        if let Err(e) = settle.await {
            debug!(url, error = %e, "post-load navigation wait failed");
        }
        Ok::<(), RenderError>(())
    };
    tokio::time::timeout(timeout, navigation)
        .await
        .map_err(|_| RenderError::Timeout {
            url: url.to_string(),
            timeout,
        })?
}
