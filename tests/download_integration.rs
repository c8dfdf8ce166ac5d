//! Integration tests for the download module.
//!
//! These tests drive the windowed batch downloader against a mock CDN.

mod support;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use harvester_core::download::{
    AssetFetcher, BatchDownloader, FetchOutcome, HttpClient, RetryPolicy,
};
use harvester_core::SessionCookies;
use support::file_names;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, Request, Respond, ResponseTemplate};

fn downloader(concurrency: usize) -> BatchDownloader {
    let fetcher = AssetFetcher::new(
        HttpClient::new(),
        RetryPolicy::new(3, Duration::from_millis(5)),
    );
    BatchDownloader::new(fetcher, concurrency).unwrap()
}

#[tokio::test]
async fn test_batch_names_files_by_position_across_windows() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.(jpg|png|webp)$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls: Vec<String> = ["1.jpg", "2.png", "3.webp", "4.jpg", "5.jpg"]
        .iter()
        .map(|name| format!("{}/img/{name}", server.uri()))
        .collect();

    let report = downloader(2).run(&urls, dir.path(), None, None).await;

    assert_eq!(report.windows(), 3);
    assert_eq!(report.succeeded(), 5);
    assert_eq!(
        file_names(dir.path()),
        vec!["001.jpg", "002.png", "003.webp", "004.jpg", "005.jpg"]
    );
    let indices: Vec<usize> = report.outcomes().iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
}

/// Answers every request after `delay`, recording when each one arrived.
#[derive(Clone)]
struct SlowCdn {
    delay: Duration,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl SlowCdn {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            arrivals: Arc::default(),
        }
    }

    fn arrivals(&self) -> Vec<Instant> {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort();
        arrivals
    }

    /// Most requests whose response was still pending at the same moment.
    fn peak_in_flight(&self) -> usize {
        let arrivals = self.arrivals();
        arrivals
            .iter()
            .map(|&t| {
                arrivals
                    .iter()
                    .filter(|&&s| s <= t && t < s + self.delay)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

impl Respond for SlowCdn {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200)
            .set_body_bytes(b"img".to_vec())
            .set_delay(self.delay)
    }
}

#[tokio::test]
async fn test_window_caps_in_flight_and_waits_for_previous_window() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let delay = Duration::from_millis(150);
    let cdn = SlowCdn::new(delay);
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow/\d+\.jpg$"))
        .respond_with(cdn.clone())
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls: Vec<String> = (1..=7)
        .map(|n| format!("{}/slow/{n}.jpg", server.uri()))
        .collect();

    let report = downloader(3).run(&urls, dir.path(), None, None).await;

    assert_eq!(report.succeeded(), 7);
    assert_eq!(report.windows(), 3);
    assert_eq!(cdn.peak_in_flight(), 3);

    // Windows of 3, 3 and 1: each starts only once the previous one settled.
    let arrivals = cdn.arrivals();
    assert_eq!(arrivals.len(), 7);
    for (last_of_window, first_of_next) in [(2, 3), (5, 6)] {
        let gap = arrivals[first_of_next].duration_since(arrivals[last_of_window]);
        assert!(gap >= delay, "next window started after only {gap:?}");
    }
}

#[tokio::test]
async fn test_short_batch_runs_in_one_window() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let cdn = SlowCdn::new(Duration::from_millis(150));
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow/\d+\.jpg$"))
        .respond_with(cdn.clone())
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls: Vec<String> = (1..=4)
        .map(|n| format!("{}/slow/{n}.jpg", server.uri()))
        .collect();

    let report = downloader(10).run(&urls, dir.path(), None, None).await;

    assert_eq!(report.succeeded(), 4);
    assert_eq!(report.windows(), 1);
    assert_eq!(cdn.peak_in_flight(), 4);
}

#[tokio::test]
async fn test_failing_asset_stops_at_attempt_ceiling() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/broken.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = vec![format!("{}/broken.jpg", server.uri())];

    let report = downloader(4).run(&urls, dir.path(), None, None).await;

    match &report.outcomes()[0].status {
        FetchOutcome::Failed { attempts, reason } => {
            assert_eq!(*attempts, 3);
            assert!(reason.contains("500"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_transient_asset_error_recovers_on_retry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"finally".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = vec![format!("{}/flaky.jpg", server.uri())];

    let report = downloader(1).run(&urls, dir.path(), None, None).await;

    match &report.outcomes()[0].status {
        FetchOutcome::Written { bytes, attempts, .. } => {
            assert_eq!(*attempts, 2);
            assert_eq!(*bytes, 7);
        }
        other => panic!("expected write, got {other:?}"),
    }
}

#[tokio::test]
async fn test_placeholders_are_skipped_without_requests() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/img/loading.gif"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/real.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"real".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/img/loading.gif", server.uri()),
        "data:image/gif;base64,R0lGODlhAQABAAAAACw=".to_string(),
        format!("{}/img/real.jpg", server.uri()),
    ];

    let report = downloader(3).run(&urls, dir.path(), None, None).await;

    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(file_names(dir.path()), vec!["003.jpg"]);
}

#[tokio::test]
async fn test_batch_forwards_referer_and_cookies() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/guarded.jpg"))
        .and(header("referer", "https://reader.example.com/comic/chap-2"))
        .and(header("cookie", "cf_clearance=ok"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"guarded".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let urls = vec![format!("{}/guarded.jpg", server.uri())];
    let cookies: SessionCookies = [("cf_clearance", "ok")].into_iter().collect();

    let report = downloader(1)
        .run(
            &urls,
            dir.path(),
            Some("https://reader.example.com/comic/chap-2"),
            Some(&cookies),
        )
        .await;

    assert_eq!(report.succeeded(), 1);
}

#[test]
fn test_concurrency_outside_range_is_rejected() {
    for bad in [0, 101] {
        let fetcher = AssetFetcher::new(HttpClient::new(), RetryPolicy::new(1, Duration::ZERO));
        assert!(BatchDownloader::new(fetcher, bad).is_err());
    }
}
