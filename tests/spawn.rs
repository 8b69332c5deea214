//! Supervised-spawn behavior: panic capture, scope cancellation, and
//! completion-barrier accounting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use procvisor::{spawn_supervised, SpawnOptions};

#[tokio::test]
async fn test_panic_is_captured_exactly_once() {
    let (tx, mut rx) = mpsc::channel(128);

    spawn_supervised(
        |_ctx| async { panic!("fake panic") },
        SpawnOptions {
            panics: Some(tx),
            ..SpawnOptions::default()
        },
    );

    let capsule = time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for capsule")
        .expect("channel open");
    assert_eq!(capsule.payload_message(), "fake panic");
    assert!(!capsule.stack_trace().is_empty());

    // One failure, one capsule.
    assert!(time::timeout(Duration::from_millis(100), rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_panic_cancels_child_scope_not_parent() {
    let (tx, mut rx) = mpsc::channel(128);
    let parent = CancellationToken::new();
    let (token_tx, token_rx) = oneshot::channel();

    spawn_supervised(
        move |ctx| async move {
            let _ = token_tx.send(ctx.clone());
            panic!("fake panic");
        },
        SpawnOptions {
            panics: Some(tx),
            scope: Some(parent.clone()),
            ..SpawnOptions::default()
        },
    );

    let child = token_rx.await.expect("body should hand out its token");
    time::timeout(Duration::from_secs(1), child.cancelled())
        .await
        .expect("child scope should be cancelled after the panic");
    assert!(!parent.is_cancelled());

    let capsule = time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for capsule")
        .expect("channel open");
    assert_eq!(capsule.payload_message(), "fake panic");
}

#[tokio::test]
async fn test_barrier_registration_is_synchronous() {
    let tracker = TaskTracker::new();

    spawn_supervised(
        |_ctx| async {
            time::sleep(Duration::from_millis(50)).await;
        },
        SpawnOptions {
            tracker: Some(tracker.clone()),
            ..SpawnOptions::default()
        },
    );

    // No race: the unit counts before the caller can observe the barrier.
    assert_eq!(tracker.len(), 1);
}

#[tokio::test]
async fn test_barrier_drains_after_cooperative_stop() {
    let tracker = TaskTracker::new();
    let stop = CancellationToken::new();
    let exited = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let exited = Arc::clone(&exited);
        spawn_supervised(
            move |ctx| async move {
                ctx.cancelled().await;
                exited.fetch_add(1, Ordering::SeqCst);
            },
            SpawnOptions {
                tracker: Some(tracker.clone()),
                scope: Some(stop.clone()),
                ..SpawnOptions::default()
            },
        );
    }
    assert_eq!(tracker.len(), 3);

    stop.cancel();
    tracker.close();
    time::timeout(Duration::from_secs(5), tracker.wait())
        .await
        .expect("timed out waiting for drain");

    assert_eq!(exited.load(Ordering::SeqCst), 3);
    assert_eq!(tracker.len(), 0);
}

#[tokio::test]
async fn test_barrier_released_before_failure_delivery() {
    let tracker = TaskTracker::new();
    let (tx, mut rx) = mpsc::channel(8);

    spawn_supervised(
        |_ctx| async { panic!("fake panic") },
        SpawnOptions {
            panics: Some(tx),
            tracker: Some(tracker.clone()),
            ..SpawnOptions::default()
        },
    );

    time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for capsule")
        .expect("channel open");

    // Decrement precedes delivery: once the capsule arrived, the unit no
    // longer counts against the barrier.
    assert_eq!(tracker.len(), 0);
}

#[tokio::test]
async fn test_one_signal_releases_all_units() {
    let tracker = TaskTracker::new();
    let stop = CancellationToken::new();
    let (out_tx, mut out_rx) = mpsc::channel(32);

    for _ in 0..10 {
        let out = out_tx.clone();
        spawn_supervised(
            move |ctx| async move {
                ctx.cancelled().await;
                let _ = out.send(()).await;
            },
            SpawnOptions {
                tracker: Some(tracker.clone()),
                scope: Some(stop.clone()),
                ..SpawnOptions::default()
            },
        );
    }
    drop(out_tx);
    assert_eq!(tracker.len(), 10);

    stop.cancel();
    tracker.close();
    time::timeout(Duration::from_secs(5), tracker.wait())
        .await
        .expect("timed out waiting for drain");

    let mut tokens = 0;
    while out_rx.recv().await.is_some() {
        tokens += 1;
    }
    assert_eq!(tokens, 10);
}
