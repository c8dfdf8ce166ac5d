//! Shared helpers for integration tests: a scripted reader site standing in
//! for the browser, and runner wiring with millisecond timings.

#![allow(dead_code)]

#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harvester_core::acquire::{AnyOf, MissingChapterDetector, PathMarkerDetector};
use harvester_core::chapter::{ChapterResolver, ResolverSettings};
use harvester_core::download::{AssetFetcher, BatchDownloader, HttpClient, RetryPolicy};
use harvester_core::{
    AcquireError, ChapterOrchestrator, ChapterSettings, ChapterTarget, HarvestRunner,
    PageAcquirer, RenderError, SessionCookies,
};
use tokio_util::sync::CancellationToken;

pub const HOME: &str = "https://reader.example.com/comic";

/// How one chapter page behaves.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Asset URLs the page exposes.
    pub assets: Vec<String>,
    /// Content waits that fail before the page becomes ready.
    pub content_failures: u32,
    /// Navigations that never complete before one succeeds.
    pub hanging_navigations: u32,
}

/// Everything the fake site observed.
#[derive(Debug, Default)]
pub struct SiteLog {
    pub navigations: Vec<String>,
    pub reloads: u32,
    pub content_waits: u32,
    /// Events from work left running by abandoned attempts.
    pub late_events: Vec<&'static str>,
}

/// Scripted stand-in for a rendered reader site. Unknown chapter URLs bounce
/// to [`HOME`], like a site redirecting absent chapters to the series page.
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    detector: AnyOf,
    pub log: Arc<Mutex<SiteLog>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: None,
            detector: AnyOf::new().with(PathMarkerDetector::new("/chap-")),
            log: Arc::default(),
        }
    }

    /// Registers a page at `/comic/chap-<token>`.
    pub fn with_page(mut self, token: &str, page: FakePage) -> Self {
        self.pages.insert(chapter_url(token), page);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn reloads(&self) -> u32 {
        self.log.lock().unwrap().reloads
    }

    fn current_page(&mut self) -> Option<&mut FakePage> {
        let url = self.current.clone()?;
        self.pages.get_mut(&url)
    }
}

pub fn chapter_url(token: &str) -> String {
    format!("{HOME}/chap-{token}")
}

#[async_trait]
impl PageAcquirer for FakeSite {
    async fn navigate(
        &mut self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AcquireError> {
        self.log.lock().unwrap().navigations.push(url.to_string());

        let Some(page) = self.pages.get_mut(url) else {
            self.current = Some(HOME.to_string());
            return Ok(HOME.to_string());
        };

        if page.hanging_navigations > 0 {
            page.hanging_navigations -= 1;
            // The page keeps loading in the background; it may only publish
            // if its attempt is still current.
            let token = cancel.clone();
            let log = Arc::clone(&self.log);
            tokio::spawn(async move {
                tokio::select! {
                    () = token.cancelled() => log.lock().unwrap().late_events.push("cancelled"),
                    () = tokio::time::sleep(Duration::from_millis(500)) => {
                        log.lock().unwrap().late_events.push("late result published");
                    }
                }
            });
            std::future::pending::<()>().await;
        }

        self.current = Some(url.to_string());
        Ok(url.to_string())
    }

    fn is_missing_signal(&self, final_url: &str, target: &ChapterTarget) -> bool {
        self.detector.is_missing(final_url, target)
    }

    async fn current_url(&mut self) -> Result<String, AcquireError> {
        Ok(self.current.clone().unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn wait_for_content_ready(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), AcquireError> {
        self.log.lock().unwrap().content_waits += 1;
        match self.current_page() {
            Some(page) if page.content_failures > 0 => {
                page.content_failures -= 1;
                Err(AcquireError::ContentTimeout {
                    selector: selector.to_string(),
                    timeout,
                })
            }
            Some(_) => Ok(()),
            None => Err(AcquireError::navigation(RenderError::navigation(
                "about:blank",
                "no page loaded",
            ))),
        }
    }

    async fn trigger_lazy_load(&mut self, _cancel: &CancellationToken) {}

    async fn extract_asset_urls(&mut self, selector: &str) -> Result<Vec<String>, AcquireError> {
        let assets = self
            .current_page()
            .map(|p| p.assets.clone())
            .unwrap_or_default();
        if assets.is_empty() {
            return Err(AcquireError::NoAssetsFound {
                selector: selector.to_string(),
            });
        }
        Ok(assets)
    }

    async fn current_cookies(&mut self) -> Result<SessionCookies, AcquireError> {
        Ok([("reader_session", "abc123")].into_iter().collect())
    }

    async fn reload(&mut self) -> Result<(), AcquireError> {
        self.log.lock().unwrap().reloads += 1;
        Ok(())
    }
}

/// Chapter settings with millisecond delays, writing under `output`.
pub fn fast_settings(output: &Path) -> ChapterSettings {
    ChapterSettings {
        max_attempts: 3,
        timeout: Duration::from_secs(5),
        retry_delay: Duration::from_millis(5),
        content_selector: Some(".reading-detail".to_string()),
        content_timeout: Duration::from_millis(50),
        asset_selector: ".page-chapter img".to_string(),
        forward_cookies: false,
        send_referer: true,
        output_root: output.to_path_buf(),
    }
}

/// Runner over `/comic/chap-{id}` with the given suffixes and settings.
pub fn runner(settings: ChapterSettings, suffixes: &[&str], concurrency: usize) -> HarvestRunner {
    let resolver = ChapterResolver::new(ResolverSettings {
        url_template: format!("{HOME}/chap-{{id}}"),
        suffixes: suffixes.iter().map(ToString::to_string).collect(),
        ..ResolverSettings::default()
    });
    let fetcher = AssetFetcher::new(
        HttpClient::new(),
        RetryPolicy::new(3, Duration::from_millis(5)),
    );
    let downloader = BatchDownloader::new(fetcher, concurrency).unwrap();
    HarvestRunner::new(resolver, ChapterOrchestrator::new(settings, downloader))
}

/// Sorted file names inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
