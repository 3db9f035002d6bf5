//! Tests for the shared forward executor.

mod common;

use common::{DEST, MockClient, MockSink, OTHER, Reply, SOURCE};
use courier_forward::{ForwardExecutor, ForwardFailure, ForwardMetrics, Notifier};
use courier_interface::MessageRef;
use courier_rate_limit::ForwardThrottle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn executor(client: &Arc<MockClient>, sink: &Arc<MockSink>) -> ForwardExecutor {
    ForwardExecutor::new(
        client.clone(),
        Notifier::new(sink.clone()),
        ForwardThrottle::default(),
        ForwardMetrics::new(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_suspends_other_callers() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    client.script(SOURCE, 1, &[Reply::RateLimited(5)]);
    let executor = executor(&client, &sink);

    let start = Instant::now();
    let (first, second) = tokio::join!(
        executor.attempt(DEST, MessageRef(1), SOURCE),
        executor.attempt(DEST, MessageRef(2), OTHER),
    );

    assert!(matches!(first, Err(ForwardFailure::RateLimited { wait }) if wait == Duration::from_secs(5)));
    assert!(second.is_ok());

    let attempts = client.attempts();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[1].at - start >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_waiting_callers_send_in_arrival_order() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    client.script(SOURCE, 1, &[Reply::RateLimited(4)]);
    let executor = executor(&client, &sink);

    let start = Instant::now();
    let (_, second, third) = tokio::join!(
        executor.attempt(DEST, MessageRef(1), SOURCE),
        executor.attempt(DEST, MessageRef(2), SOURCE),
        executor.attempt(DEST, MessageRef(3), SOURCE),
    );

    assert!(second.is_ok() && third.is_ok());
    let attempts = client.attempts();
    let order: Vec<_> = attempts.iter().map(|a| a.message).collect();
    assert_eq!(order, vec![MessageRef(1), MessageRef(2), MessageRef(3)]);
    assert!(attempts[1].at - start >= Duration::from_secs(4));
    assert!(attempts[2].at >= attempts[1].at);
    assert_eq!(sink.count("FloodWait over"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_one_entry_and_one_resume_notice_per_suspension() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    client.script(SOURCE, 1, &[Reply::RateLimited(3)]);
    let executor = executor(&client, &sink);

    let (first, _, _) = tokio::join!(
        executor.forward(DEST, MessageRef(1), SOURCE),
        executor.attempt(DEST, MessageRef(2), SOURCE),
        executor.attempt(DEST, MessageRef(3), SOURCE),
    );

    assert!(matches!(first, Err(ForwardFailure::RateLimited { .. })));
    assert_eq!(sink.count("FloodWait detected"), 1);
    assert_eq!(sink.count("FloodWait over"), 1);
    assert!(!executor.rate_limit().is_suspended());
}

#[tokio::test(start_paused = true)]
async fn test_forward_returns_after_wait() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    client.script(SOURCE, 1, &[Reply::RateLimited(7)]);
    let executor = executor(&client, &sink);

    let start = Instant::now();
    let result = executor.forward(DEST, MessageRef(1), SOURCE).await;

    assert!(result.is_err());
    assert!(start.elapsed() >= Duration::from_secs(7));
    assert_eq!(client.attempts().len(), 1);
}

#[tokio::test]
async fn test_permanent_error_does_not_suspend() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    client.script(SOURCE, 1, &[Reply::Permanent]);
    let executor = executor(&client, &sink);

    let result = executor.attempt(DEST, MessageRef(1), SOURCE).await;

    assert!(matches!(result, Err(ForwardFailure::Permanent(_))));
    assert!(!executor.rate_limit().is_suspended());
    assert!(sink.texts().is_empty());
}

#[tokio::test]
async fn test_attempt_when_skips_closed_gate() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    let executor = executor(&client, &sink);

    let skipped = executor
        .attempt_when(|| false, DEST, MessageRef(1), SOURCE)
        .await;
    let sent = executor
        .attempt_when(|| true, DEST, MessageRef(2), SOURCE)
        .await;

    assert!(skipped.is_none());
    assert!(matches!(sent, Some(Ok(_))));
    assert_eq!(client.attempts_from(SOURCE), vec![MessageRef(2)]);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_caps_forward_stream() {
    let client = Arc::new(MockClient::new());
    let sink = Arc::new(MockSink::new());
    let executor = ForwardExecutor::new(
        client.clone(),
        Notifier::new(sink.clone()),
        ForwardThrottle::new(Some(60)),
        ForwardMetrics::new(),
    );

    for message in 1..=3 {
        assert!(executor.attempt(DEST, MessageRef(message), SOURCE).await.is_ok());
    }

    assert_eq!(client.attempts().len(), 3);
}
