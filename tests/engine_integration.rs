//! Integration tests for the download engine against a mock HTTP server.
//!
//! Covers idempotent re-runs, sequential naming, retry exhaustion, the
//! failure ledger and the retry pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use harvester_core::{DownloadOutcome, FileNamer, InvalidReason, RetryPolicy, RetrySummary};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, Request, Respond, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::{engine, engine_with_namer, engine_with_policy};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn image_response(body: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "image/jpeg")
        .set_body_bytes(body.to_vec())
}

/// Fails the first `fail_count` requests with 503, then serves an image.
struct FlakyResponder {
    request_count: Arc<AtomicUsize>,
    fail_count: usize,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let seen = self.request_count.fetch_add(1, Ordering::SeqCst);
        if seen < self.fail_count {
            ResponseTemplate::new(503)
        } else {
            image_response(b"recovered")
        }
    }
}

#[tokio::test]
async fn test_download_writes_file_and_second_call_skips() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/wp-content/uploads/2024/05/photo.jpg"))
        .respond_with(image_response(b"jpeg bytes"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let url = format!("{}/wp-content/uploads/2024/05/photo.jpg", mock_server.uri());

    let first = engine.download(&url).await;
    assert_eq!(
        first,
        DownloadOutcome::Downloaded {
            url: url.clone(),
            filename: "photo.jpg".to_string(),
            bytes: 10,
        }
    );
    assert_eq!(
        std::fs::read(temp_dir.path().join("photo.jpg")).unwrap(),
        b"jpeg bytes"
    );

    let second = engine.download(&url).await;
    assert!(
        matches!(second, DownloadOutcome::Skipped { ref filename, .. } if filename == "photo.jpg"),
        "{second:?}"
    );

    let stats = engine.stats();
    assert_eq!(stats.downloaded(), 1);
    assert_eq!(stats.skipped(), 1);
    assert_eq!(engine.currently_failed(), 0);
}

#[tokio::test]
async fn test_download_sends_referer_of_image_origin() {
    let mock_server = require_mock_server!();
    let referer = format!("{}/", mock_server.uri());
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .and(header("referer", referer.as_str()))
        .respond_with(image_response(b"png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let outcome = engine.download(&format!("{}/a.png", mock_server.uri())).await;
    assert!(outcome.is_downloaded(), "{outcome:?}");
}

#[tokio::test]
async fn test_sequential_numbering_across_downloads() {
    let mock_server = require_mock_server!();
    for name in ["a.jpg", "b.png", "c.gif"] {
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(image_response(name.as_bytes()))
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine_with_namer(temp_dir.path(), FileNamer::new("img_", true, 1, 3));

    for name in ["a.jpg", "b.png", "c.gif"] {
        let outcome = engine
            .download(&format!("{}/{name}", mock_server.uri()))
            .await;
        assert!(outcome.is_downloaded(), "{outcome:?}");
    }

    for expected in ["img_001_a.jpg", "img_002_b.png", "img_003_c.gif"] {
        assert!(
            temp_dir.path().join(expected).is_file(),
            "missing {expected}"
        );
    }
    assert_eq!(engine.namer().cursor(), 4);
}

#[tokio::test]
async fn test_percent_encoded_basename_is_decoded() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/my%20photo.jpg"))
        .respond_with(image_response(b"x"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let outcome = engine
        .download(&format!("{}/my%20photo.jpg", mock_server.uri()))
        .await;

    assert!(outcome.is_downloaded(), "{outcome:?}");
    assert!(temp_dir.path().join("my photo.jpg").is_file());
}

#[tokio::test]
async fn test_double_encoded_basename_is_decoded_once() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/a%20b.jpg"))
        .respond_with(image_response(b"x"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let outcome = engine
        .download(&format!("{}/a%2520b.jpg", mock_server.uri()))
        .await;

    assert!(
        matches!(outcome, DownloadOutcome::Downloaded { ref filename, .. } if filename == "a%20b.jpg"),
        "{outcome:?}"
    );
    assert!(temp_dir.path().join("a%20b.jpg").is_file());
    assert!(!temp_dir.path().join("a b.jpg").exists());
}

#[tokio::test]
async fn test_retries_pause_between_attempts() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/busy.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let delay = Duration::from_millis(100);
    let mut engine = engine_with_policy(temp_dir.path(), RetryPolicy::fixed(3, delay));

    let started = Instant::now();
    let outcome = engine
        .download(&format!("{}/busy.jpg", mock_server.uri()))
        .await;
    let elapsed = started.elapsed();

    assert!(outcome.is_failed(), "{outcome:?}");
    assert!(
        elapsed >= delay * 2,
        "3 attempts need 2 pauses of {delay:?}, took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_retry_exhaustion_records_failure_once() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/down.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let url = format!("{}/down.jpg", mock_server.uri());

    let outcome = engine.download(&url).await;
    match &outcome {
        DownloadOutcome::Failed { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(engine.ledger().contains(&url));
    assert_eq!(engine.ledger().len(), 1);
    assert_eq!(engine.stats().total_failed(), 1);

    assert!(engine.download(&url).await.is_failed());
    assert_eq!(engine.ledger().snapshot(), vec![url.clone()]);
    assert_eq!(engine.stats().total_failed(), 2);
    assert!(
        !temp_dir.path().join("down.jpg").exists(),
        "failed download must not leave a file"
    );
}

#[tokio::test]
async fn test_transient_failure_recovers_within_attempts() {
    let mock_server = require_mock_server!();
    let request_count = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(FlakyResponder {
            request_count: Arc::clone(&request_count),
            fail_count: 2,
        })
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let outcome = engine
        .download(&format!("{}/flaky.jpg", mock_server.uri()))
        .await;

    assert!(outcome.is_downloaded(), "{outcome:?}");
    assert_eq!(request_count.load(Ordering::SeqCst), 3);
    assert_eq!(engine.currently_failed(), 0);
}

#[tokio::test]
async fn test_retry_all_recovers_ledger_entries() {
    let mock_server = require_mock_server!();
    let request_count = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/later.jpg"))
        .respond_with(FlakyResponder {
            request_count: Arc::clone(&request_count),
            fail_count: 3,
        })
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let later = format!("{}/later.jpg", mock_server.uri());
    let gone = format!("{}/gone.jpg", mock_server.uri());

    assert!(engine.download(&later).await.is_failed());
    assert!(engine.download(&gone).await.is_failed());
    assert_eq!(engine.currently_failed(), 2);

    let summary = engine.retry_all().await;
    assert_eq!(
        summary,
        RetrySummary {
            remaining: 2,
            succeeded: 1,
            still_failed: 1,
        }
    );
    assert!(!engine.ledger().contains(&later));
    assert!(engine.ledger().contains(&gone));
    assert_eq!(engine.stats().downloaded(), 1);
    assert_eq!(engine.stats().total_failed(), 3);
    assert!(temp_dir.path().join("later.jpg").is_file());
}

#[tokio::test]
async fn test_non_image_content_type_is_invalid_without_retry() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/fake.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    let outcome = engine
        .download(&format!("{}/fake.jpg", mock_server.uri()))
        .await;

    match outcome {
        DownloadOutcome::Invalid {
            reason: InvalidReason::NotAnImage { content_type },
            ..
        } => assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8")),
        other => panic!("expected content-type rejection, got {other:?}"),
    }
    assert_eq!(engine.currently_failed(), 0);
    assert_eq!(engine.stats().invalid(), 1);
    assert!(!temp_dir.path().join("fake.jpg").exists());
}

#[tokio::test]
async fn test_retry_all_with_empty_ledger_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());
    assert_eq!(engine.retry_all().await, RetrySummary::default());
}

#[tokio::test]
async fn test_invalid_url_never_touches_network() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine = engine(temp_dir.path());

    for url in ["", "not a url", "https://example.com/page.html"] {
        let outcome = engine.download(url).await;
        assert!(
            matches!(outcome, DownloadOutcome::Invalid { .. }),
            "{url:?} gave {outcome:?}"
        );
    }
    assert_eq!(engine.stats().invalid(), 3);
    assert_eq!(engine.currently_failed(), 0);
}
