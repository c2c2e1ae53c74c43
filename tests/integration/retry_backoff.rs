//! Retry transport backoff timing and give-up conditions

use crate::integration::test_utils::{press, send_error, RecordingTransport};
use std::time::Duration;
use tokio::time::Instant;
use tracker::error::TransportError;
use tracker::transport::{RetryConfig, RetryTransport, TrackerTransport};

fn config(max_attempts: usize) -> RetryConfig {
    RetryConfig {
        max_attempts,
        max_retry_ms: None,
        min_timeout_ms: 1000,
        max_timeout_ms: None,
        retry_factor: 2.0,
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_failures_then_success_waits_min_plus_min_times_factor() {
    let inner = RecordingTransport::scripted(vec![send_error(), send_error()]);
    let retry = RetryTransport::new(inner.clone(), config(10));

    let started = Instant::now();
    retry.handle(vec![press("a")]).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(inner.calls(), 3);
    assert!(elapsed >= Duration::from_millis(3000), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3100), "elapsed {:?}", elapsed);
    assert_eq!(inner.delivered_ids(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let inner = RecordingTransport::scripted(vec![send_error(), send_error(), send_error(), send_error()]);
    let retry = RetryTransport::new(inner.clone(), config(3));

    let err = retry.handle(vec![press("a")]).await.unwrap_err();
    assert!(matches!(err, TransportError::RetriesExhausted { attempts: 3, .. }));
    assert!(!err.is_retryable());
    assert_eq!(inner.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_errors_propagate_immediately() {
    let inner = RecordingTransport::scripted(vec![Err(TransportError::Unusable(
        "offline".to_string(),
    ))]);
    let retry = RetryTransport::new(inner.clone(), config(10));

    let started = Instant::now();
    let err = retry.handle(vec![press("a")]).await.unwrap_err();
    assert!(matches!(err, TransportError::Unusable(_)));
    assert_eq!(inner.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_retry_window_bounds_total_wait() {
    let inner = RecordingTransport::scripted(vec![send_error(), send_error(), send_error()]);
    let retry = RetryTransport::new(
        inner.clone(),
        RetryConfig {
            max_retry_ms: Some(2500),
            ..config(10)
        },
    );

    let started = Instant::now();
    let err = retry.handle(vec![press("a")]).await.unwrap_err();
    // Second wait (2000ms) would end at 3000ms, past the 2500ms window.
    assert!(matches!(err, TransportError::RetryWindowElapsed { .. }));
    assert_eq!(inner.calls(), 2);
    assert!(started.elapsed() < Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped_by_max_timeout() {
    let inner = RecordingTransport::scripted(vec![send_error(), send_error(), send_error()]);
    let retry = RetryTransport::new(
        inner.clone(),
        RetryConfig {
            max_timeout_ms: Some(1500),
            ..config(10)
        },
    );

    let started = Instant::now();
    retry.handle(vec![press("a")]).await.unwrap();
    // 1000 + 1500 + 1500 instead of 1000 + 2000 + 4000.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4000));
    assert!(elapsed < Duration::from_millis(4100));
    assert_eq!(inner.calls(), 4);
}
