//! Retry queue draining tests.

mod common;

use common::{Harness, OTHER, Reply, SOURCE};
use courier_forward::{LiveOutcome, RetryOutcome};
use courier_interface::{MessageEvent, MessageRef};
use std::time::Duration;

/// Leave message `message` in the retry queue after two rate limits.
async fn queue_message(h: &Harness, message: i64) {
    h.client.script(
        SOURCE,
        message,
        &[Reply::RateLimited(1), Reply::RateLimited(1)],
    );
    let outcome = h
        .forwarder
        .on_message(MessageEvent::new(SOURCE, message))
        .await;
    assert_eq!(outcome, LiveOutcome::Queued);
}

#[tokio::test(start_paused = true)]
async fn test_item_removed_exactly_once_after_rate_limits() {
    for rejections in 0..4 {
        let h = Harness::new();
        queue_message(&h, 1).await;
        let replies = vec![Reply::RateLimited(3); rejections];
        h.client.script(SOURCE, 1, &replies);

        let outcome = h.forwarder.run_retry_cycle().await;

        assert!(matches!(outcome, RetryOutcome::Delivered(_)));
        assert!(h.forwarder.pending_forwards().is_empty());
        assert_eq!(h.client.attempts().len(), 2 + rejections + 1);
        assert_eq!(h.sink.count("Queued message forwarded successfully"), 1);

        // Nothing left to redeliver.
        assert_eq!(h.forwarder.run_retry_cycle().await, RetryOutcome::Idle);
        assert_eq!(h.client.attempts().len(), 2 + rejections + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_items_drain_in_insertion_order() {
    let h = Harness::new();
    queue_message(&h, 5).await;
    queue_message(&h, 3).await;
    queue_message(&h, 9).await;

    let mut drained = Vec::new();
    while let RetryOutcome::Delivered(item) = h.forwarder.run_retry_cycle().await {
        drained.push(item.message);
    }

    assert_eq!(drained, vec![MessageRef(5), MessageRef(3), MessageRef(9)]);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_drops_queued_item() {
    let h = Harness::new();
    queue_message(&h, 1).await;
    h.client.script(SOURCE, 1, &[Reply::Permanent]);

    let outcome = h.forwarder.run_retry_cycle().await;

    assert!(matches!(outcome, RetryOutcome::Abandoned(item) if item.message == MessageRef(1)));
    assert!(h.forwarder.pending_forwards().is_empty());
    assert_eq!(h.sink.count("Failed to forward queued message"), 1);
    assert_eq!(h.forwarder.metrics().snapshot().abandoned, 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_retry_attempts_while_bulk_in_progress() {
    let h = Harness::new();
    queue_message(&h, 1).await;
    h.client.with_history(OTHER, 3);
    h.forwarder.request_bulk_replay(OTHER).await;

    let bulk = {
        let forwarder = h.forwarder.clone();
        tokio::spawn(async move { forwarder.run_bulk_cycle().await })
    };
    while !h.forwarder.bulk_in_progress() {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.forwarder.run_retry_cycle().await, RetryOutcome::Deferred);
    let outcome = bulk.await.expect("bulk task");
    assert!(outcome.is_some());
    assert!(!h.forwarder.bulk_in_progress());

    // Every bulk item went out before the queued live message.
    let sources: Vec<_> = h.client.attempts().iter().map(|a| a.source).collect();
    assert_eq!(sources, vec![SOURCE, SOURCE, OTHER, OTHER, OTHER]);

    assert!(matches!(
        h.forwarder.run_retry_cycle().await,
        RetryOutcome::Delivered(_)
    ));
    assert_eq!(h.client.attempts_from(SOURCE).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_yields_when_bulk_starts_mid_backoff() {
    let h = Harness::new();
    queue_message(&h, 1).await;
    h.client.script(SOURCE, 1, &[Reply::RateLimited(30)]);
    h.client.with_history(OTHER, 2);
    h.forwarder.request_bulk_replay(OTHER).await;

    let retry = {
        let forwarder = h.forwarder.clone();
        tokio::spawn(async move { forwarder.run_retry_cycle().await })
    };
    // Let the retry hit its rate limit and start waiting.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.client.attempts_from(SOURCE).len(), 3);

    let bulk = h.forwarder.run_bulk_cycle().await;
    assert!(bulk.is_some());

    assert_eq!(retry.await.expect("retry task"), RetryOutcome::Deferred);
    assert_eq!(h.client.attempts_from(SOURCE).len(), 3);
    assert_eq!(h.forwarder.pending_forwards().len(), 1);
}
