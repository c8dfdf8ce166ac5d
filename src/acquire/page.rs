//! [`PageAcquirer`] over a [`RenderSession`].
//!
//! Page-context scripts only read the DOM or scroll; all decisions (which
//! attribute wins, when scrolling is done, how relative URLs resolve) are
//! made here in Rust so they can be tested without a browser.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::{AcquireError, MissingChapterDetector, PageAcquirer, SessionCookies};
use crate::chapter::ChapterTarget;
use crate::download::filename::is_inline_data;
use crate::renderer::RenderSession;

const CONTENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Scroll simulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LazyLoadSettings {
    /// Pixels scrolled per step.
    pub step_px: u32,
    /// Pause between steps.
    pub interval: Duration,
    /// Upper bound on total scrolling time.
    pub max_duration: Duration,
}

impl Default for LazyLoadSettings {
    fn default() -> Self {
        Self {
            step_px: 300,
            interval: Duration::from_millis(50),
            max_duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScrollProgress {
    /// Bottom edge of the viewport after the step.
    reached: f64,
    /// Document scroll height after the step.
    height: f64,
}

/// Drives one shared browser page through chapter visits.
pub struct RenderedPageAcquirer<S> {
    session: S,
    detector: Box<dyn MissingChapterDetector>,
    deferred_attributes: Vec<String>,
    lazy_load: LazyLoadSettings,
    navigation_timeout: Duration,
}

impl<S: RenderSession> RenderedPageAcquirer<S> {
    /// Wraps `session`, classifying missing chapters with `detector`.
    pub fn new(session: S, detector: impl MissingChapterDetector + 'static) -> Self {
        Self {
            session,
            detector: Box::new(detector),
            deferred_attributes: vec!["data-original".to_string(), "data-src".to_string()],
            lazy_load: LazyLoadSettings::default(),
            navigation_timeout: Duration::from_secs(45),
        }
    }

    /// Attributes read before `src`, in priority order.
    #[must_use]
    pub fn with_deferred_attributes(mut self, attributes: Vec<String>) -> Self {
        self.deferred_attributes = attributes;
        self
    }

    /// Replaces the scroll settings.
    #[must_use]
    pub fn with_lazy_load(mut self, settings: LazyLoadSettings) -> Self {
        self.lazy_load = settings;
        self
    }

    /// Per-navigation timeout passed to the session.
    #[must_use]
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Returns the wrapped session.
    pub fn into_session(self) -> S {
        self.session
    }

    fn extraction_script(&self, selector: &str) -> String {
        let mut attributes = self.deferred_attributes.clone();
        attributes.push("src".to_string());
        format!(
            "(() => Array.from(document.querySelectorAll({sel})).map(el => {attrs}.map(a => el.getAttribute(a) || '')))()",
            sel = js_string(selector),
            attrs = serde_json::Value::from(attributes),
        )
    }
}

#[async_trait]
impl<S: RenderSession> PageAcquirer for RenderedPageAcquirer<S> {
    #[instrument(skip(self, cancel))]
    async fn navigate(
        &mut self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AcquireError> {
        let timeout = self.navigation_timeout;
        tokio::select! {
            result = self.session.goto(url, timeout) => result.map_err(AcquireError::navigation),
            () = cancel.cancelled() => Err(AcquireError::Cancelled),
        }
    }

    fn is_missing_signal(&self, final_url: &str, target: &ChapterTarget) -> bool {
        self.detector.is_missing(final_url, target)
    }

    async fn current_url(&mut self) -> Result<String, AcquireError> {
        self.session
            .current_url()
            .await
            .map_err(AcquireError::session)
    }

    #[instrument(skip(self))]
    async fn wait_for_content_ready(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), AcquireError> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        let deadline = Instant::now() + timeout;

        loop {
            match self.session.evaluate(&script).await {
                Ok(serde_json::Value::Bool(true)) => return Ok(()),
                Ok(_) => {}
                // The page may be mid-navigation; keep polling until the deadline.
                Err(e) => debug!(error = %e, "content poll failed"),
            }
            if Instant::now() + CONTENT_POLL_INTERVAL > deadline {
                return Err(AcquireError::ContentTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(CONTENT_POLL_INTERVAL).await;
        }
    }

    #[instrument(skip(self, cancel))]
    async fn trigger_lazy_load(&mut self, cancel: &CancellationToken) {
        let script = format!(
            "(() => {{ window.scrollBy(0, {}); return {{ reached: window.scrollY + window.innerHeight, height: document.body.scrollHeight }}; }})()",
            self.lazy_load.step_px
        );
        let deadline = Instant::now() + self.lazy_load.max_duration;
        let mut steps = 0u32;

        loop {
            if cancel.is_cancelled() || Instant::now() >= deadline {
                debug!(steps, "lazy load stopped before reaching bottom");
                return;
            }
            let progress = match self.session.evaluate(&script).await {
                Ok(value) => serde_json::from_value::<ScrollProgress>(value),
                Err(e) => {
                    debug!(error = %e, "scroll step failed");
                    return;
                }
            };
            steps += 1;
            match progress {
                Ok(p) if p.reached >= p.height => {
                    debug!(steps, height = p.height, "lazy load reached bottom");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "unexpected scroll result");
                    return;
                }
            }
            tokio::select! {
                () = tokio::time::sleep(self.lazy_load.interval) => {}
                () = cancel.cancelled() => return,
            }
        }
    }

    #[instrument(skip(self))]
    async fn extract_asset_urls(&mut self, selector: &str) -> Result<Vec<String>, AcquireError> {
        let value = self
            .session
            .evaluate(&self.extraction_script(selector))
            .await
            .map_err(AcquireError::session)?;
        let candidates: Vec<Vec<String>> = serde_json::from_value(value)
            .map_err(|e| AcquireError::session(crate::renderer::RenderError::script(e)))?;

        let base = self
            .session
            .current_url()
            .await
            .ok()
            .and_then(|u| Url::parse(&u).ok());

        let urls: Vec<String> = candidates
            .iter()
            .filter_map(|c| pick_asset_source(c))
            .map(|raw| resolve_asset_url(base.as_ref(), raw))
            .collect();

        debug!(matched = candidates.len(), usable = urls.len(), "extracted assets");
        if urls.is_empty() {
            return Err(AcquireError::NoAssetsFound {
                selector: selector.to_string(),
            });
        }
        Ok(urls)
    }

    async fn current_cookies(&mut self) -> Result<SessionCookies, AcquireError> {
        let pairs = self.session.cookies().await.map_err(AcquireError::session)?;
        Ok(pairs.into_iter().collect())
    }

    async fn reload(&mut self) -> Result<(), AcquireError> {
        self.session
            .reload(self.navigation_timeout)
            .await
            .map(|_| ())
            .map_err(AcquireError::navigation)
    }
}

/// Picks the first usable value from an element's attribute values, given
/// deferred attributes first and `src` last. Empty and inline-data values
/// are skipped.
#[must_use]
pub fn pick_asset_source(candidates: &[String]) -> Option<&str> {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty() && !is_inline_data(c))
}

/// Resolves a relative asset URL against the page URL. Absolute and
/// protocol-relative values, or anything when `base` is unknown, pass
/// through unchanged.
#[must_use]
pub fn resolve_asset_url(base: Option<&Url>, raw: &str) -> String {
    if raw.starts_with("//") || Url::parse(raw).is_ok() {
        return raw.to_string();
    }
    base.and_then(|b| b.join(raw).ok())
        .map_or_else(|| raw.to_string(), String::from)
}

fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}
