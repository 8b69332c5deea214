//! # Generic Start/Stop state machine for any [`Executor`].
//!
//! Drives a worker through a controlled lifecycle using
//! [`spawn_supervised`](crate::spawn_supervised) and the worker's
//! [`ProcessState`]:
//!
//! ```text
//! Stopped ──start()──► Starting ──confirmed──► Running
//!    ▲                     │ error/timeout        │
//!    │                     ▼                      ▼
//!    └────────────────── Stopped ◄──drained── Stopping ──timeout──► Running
//!                                                        (retry stop)
//! ```
//!
//! ## Start
//! 1. `AlreadyStarted` fail-fast if the worker is running (no side effects).
//! 2. Fresh completion barrier + stop signal installed, discarding any from
//!    a previous run.
//! 3. The worker's `execute` body is spawned supervised, registered on the
//!    new barrier, failures routed to the caller's channel.
//! 4. Exactly one of three outcomes: startup confirmed (running), worker
//!    error (not running), startup timeout (not running, startable again).
//!
//! ## Stop
//! 1. `AlreadyStopped` fail-fast if not running.
//! 2. The stop signal is raised exactly once; repeated Stop calls skip
//!    re-raising (guarded by the stop-initiated flag).
//! 3. Wait for the barrier to drain, bounded by the shutdown budget. The
//!    barrier, not a timer, is the source of truth for "every spawned unit
//!    has actually exited". On timeout the worker stays marked running and
//!    Stop may be retried (or escalated via [`stop_or_cancel`]).
//!
//! ## Rules
//! - Start/Stop are serialized per worker; concurrent callers queue.
//! - A Stop timeout drops the drain wait; nothing lingers in the background.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::LifecycleConfig;
use crate::error::ExecError;
use crate::panics::PanicCapsule;
use crate::process::{ExecutorRef, ProcessState, Settings};
use crate::spawn::{spawn_supervised, SpawnOptions};

/// Starts the worker with the reference budgets ([`LifecycleConfig::default`]).
///
/// See [`start_with`].
pub async fn start(
    worker: &ExecutorRef,
    settings: Settings,
    panics: mpsc::Sender<PanicCapsule>,
) -> Result<(), ExecError> {
    start_with(worker, settings, panics, &LifecycleConfig::default()).await
}

/// Starts the worker, waiting up to `cfg.start_timeout` for confirmation.
///
/// The worker's `execute` body runs as a supervised unit registered on a
/// fresh completion barrier; panics inside it (or any unit it spawns with
/// the same channel) arrive on `panics`.
///
/// ### Outcomes (exactly one per call)
/// - `Ok(())` — the worker confirmed startup; it is now running.
/// - `Err(e)` from the worker — setup failed; the worker is not running.
/// - `Err(StartTimeout)` — no confirmation in time; the worker is not
///   running and may be started again.
pub async fn start_with(
    worker: &ExecutorRef,
    settings: Settings,
    panics: mpsc::Sender<PanicCapsule>,
    cfg: &LifecycleConfig,
) -> Result<(), ExecError> {
    let state = worker.state();
    let _op = state.op_lock().await;

    if state.is_running() {
        return Err(ExecError::AlreadyStarted);
    }

    let tracker = TaskTracker::new();
    let stop = CancellationToken::new();
    state.install_run(stop, tracker.clone());

    let body_worker = Arc::clone(worker);
    let body_panics = panics.clone();
    let errors = state.error_sender();
    spawn_supervised(
        move |_ctx| async move {
            // A setup error returned by the body surfaces on the error
            // channel, where the startup wait below picks it up.
            if let Err(err) = body_worker.execute(settings, body_panics).await {
                let _ = errors.try_send(err);
            }
        },
        SpawnOptions {
            panics: Some(panics),
            tracker: Some(tracker),
            scope: None,
        },
    );

    wait_for_startup(state, cfg).await
}

/// Stops the worker with the reference budgets ([`LifecycleConfig::default`]).
///
/// See [`stop_with`].
pub async fn stop(worker: &ExecutorRef) -> Result<(), ExecError> {
    stop_with(worker, &LifecycleConfig::default()).await
}

/// Stops the worker, waiting up to `cfg.stop_timeout` for a full drain.
///
/// On `Err(StopTimeout)` the worker is still considered running; the caller
/// may retry or escalate with [`stop_or_cancel`]. On `Ok(())` every unit
/// spawned by the run has exited and the worker is eligible for a fresh
/// [`start`].
pub async fn stop_with(worker: &ExecutorRef, cfg: &LifecycleConfig) -> Result<(), ExecError> {
    let state = worker.state();
    let _op = state.op_lock().await;

    if !state.is_running() {
        return Err(ExecError::AlreadyStopped);
    }

    // Raise the one-shot signal exactly once across repeated Stop calls.
    if !state.stop_initiated() {
        state.stop_token().cancel();
        state.set_stop_initiated(true);
    }

    wait_for_shutdown(state, cfg).await?;

    state.set_running(false);
    state.set_stop_initiated(false);
    Ok(())
}

/// Stops the worker, escalating to forced cancellation on timeout.
///
/// When graceful Stop exceeds its budget and the worker implements
/// [`Cancel`](crate::Cancel), its `cancel` is invoked best-effort. The
/// timeout error is still returned: forced cancellation makes no drain
/// guarantee, so the caller keeps the accurate picture.
pub async fn stop_or_cancel(worker: &ExecutorRef, cfg: &LifecycleConfig) -> Result<(), ExecError> {
    match stop_with(worker, cfg).await {
        Err(err @ ExecError::StopTimeout { .. }) => {
            if let Some(forced) = worker.as_cancel() {
                forced.cancel();
            }
            Err(err)
        }
        other => other,
    }
}

/// Blocks on the first of: startup confirmation, worker error, timeout.
async fn wait_for_startup(state: &ProcessState, cfg: &LifecycleConfig) -> Result<(), ExecError> {
    tokio::select! {
        Some(()) = state.recv_started() => {
            state.set_running(true);
            Ok(())
        }
        Some(err) = state.recv_error() => Err(err),
        _ = time::sleep(cfg.start_timeout) => Err(ExecError::StartTimeout {
            timeout: cfg.start_timeout,
        }),
    }
}

/// Waits for the completion barrier to drain, bounded by the budget.
///
/// The losing drain-wait future is dropped by `select!`; a timed-out Stop
/// leaves no background waiter behind.
async fn wait_for_shutdown(state: &ProcessState, cfg: &LifecycleConfig) -> Result<(), ExecError> {
    let tracker = state.tracker();
    tracker.close();

    tokio::select! {
        _ = tracker.wait() => Ok(()),
        _ = time::sleep(cfg.stop_timeout) => Err(ExecError::StopTimeout {
            timeout: cfg.stop_timeout,
        }),
    }
}
