//! # Supervised spawn: the panic-capturing replacement for a bare `tokio::spawn`.
//!
//! [`spawn_supervised`] launches a unit of work on the runtime while
//! intercepting unrecoverable failures at the unit boundary. A panic inside
//! the body never reaches the caller and never aborts the process; it is
//! converted into a [`PanicCapsule`] and delivered asynchronously.
//!
//! ## Contract
//! ```text
//! spawn_supervised(body, { panics?, tracker?, scope? })
//!   ├─► tracker: registered synchronously BEFORE the task is scheduled,
//!   │            released unconditionally when the unit ends
//!   ├─► scope:   a child token is derived and passed into `body`;
//!   │            the child is cancelled if `body` panics
//!   └─► panics:  delivery target for the capsule; absent ⇒ the failure
//!                is silently absorbed (callers needing observability must
//!                supply a buffered channel and keep draining it)
//! ```
//!
//! ## Rules
//! - The caller returns immediately after scheduling.
//! - Barrier release happens **before** failure delivery: a waiter on the
//!   tracker may observe "drained" slightly before the capsule arrives.
//! - An undersized failure channel makes the failing unit block on delivery;
//!   size the buffer so delivery cannot stall shutdown.

use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::panics::{install_capture_hook, take_captured_trace, PanicCapsule};

/// Optional collaborators for a supervised unit.
///
/// All fields default to `None`; supply only what the unit needs.
#[derive(Default)]
pub struct SpawnOptions {
    /// Delivery target for a [`PanicCapsule`] if the body panics.
    pub panics: Option<mpsc::Sender<PanicCapsule>>,
    /// Completion barrier the unit registers on for its whole lifetime.
    pub tracker: Option<TaskTracker>,
    /// Parent cancellation scope; the body receives a child of it.
    pub scope: Option<CancellationToken>,
}

/// Spawns `body` as a supervised unit of work.
///
/// The body always receives a [`CancellationToken`]: a child of
/// `options.scope` when one is supplied, otherwise a fresh token. On panic
/// that token is cancelled, so sibling work the body had derived from it is
/// torn down too.
///
/// # Example
/// ```
/// use procvisor::{spawn_supervised, SpawnOptions};
/// use tokio::sync::mpsc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (tx, mut rx) = mpsc::channel(128);
///
/// spawn_supervised(
///     |_ctx| async { panic!("fake panic") },
///     SpawnOptions {
///         panics: Some(tx),
///         ..SpawnOptions::default()
///     },
/// );
///
/// let capsule = rx.recv().await.expect("capsule");
/// assert_eq!(capsule.payload_message(), "fake panic");
/// assert!(!capsule.stack_trace().is_empty());
/// # }
/// ```
pub fn spawn_supervised<F, Fut>(body: F, options: SpawnOptions) -> JoinHandle<()>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    install_capture_hook();

    let SpawnOptions {
        panics,
        tracker,
        scope,
    } = options;

    let ctx = match &scope {
        Some(parent) => parent.child_token(),
        None => CancellationToken::new(),
    };

    // Register before scheduling so a caller that immediately waits on the
    // barrier cannot race a not-yet-registered unit.
    let registration = tracker.as_ref().map(TaskTracker::token);

    tokio::spawn(async move {
        let result = AssertUnwindSafe(body(ctx.clone())).catch_unwind().await;

        // Barrier release precedes failure delivery.
        drop(registration);

        if let Err(payload) = result {
            ctx.cancel();
            let raw = take_captured_trace()
                .unwrap_or_else(|| Backtrace::force_capture().to_string());
            if let Some(tx) = panics {
                let _ = tx.send(PanicCapsule::new(payload, &raw)).await;
            }
        }
    })
}
