//! # Per-worker state driven by the generic orchestrator.
//!
//! [`ProcessState`] bundles everything [`start`](crate::start) and
//! [`stop`](crate::stop) need from a worker: the startup/error channels
//! (created once, for the life of the worker), the per-run stop token and
//! completion barrier (replaced by every Start), and the running /
//! stop-initiated flags.
//!
//! ## Invariants
//! - `running` is true only between a successful Start and a successful Stop.
//! - `stop_initiated` is true only while a raised stop signal has not yet
//!   been confirmed drained.
//! - Every Start installs a **fresh** stop token and barrier; stale handles
//!   from a previous run are never reused.
//!
//! Start/Stop are serialized through an internal async mutex, so concurrent
//! callers cannot interleave the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::MutexGuard;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::ExecError;

/// One slot is enough: startup is confirmed at most once per run.
const STARTED_CAPACITY: usize = 1;
/// Small buffer so a worker can report without blocking its loop.
const ERROR_CAPACITY: usize = 8;

/// Handles that are scoped to a single run.
struct RunHandles {
    stop: CancellationToken,
    tracker: TaskTracker,
}

/// State a worker exposes to be controllable by the orchestrator.
///
/// Embed one per worker and return it from
/// [`Executor::state`](crate::Executor::state). The worker-facing surface is
/// [`signal_started`](ProcessState::signal_started),
/// [`report_error`](ProcessState::report_error),
/// [`stop_token`](ProcessState::stop_token) and
/// [`tracker`](ProcessState::tracker); everything else belongs to the
/// orchestrator.
pub struct ProcessState {
    running: AtomicBool,
    stop_initiated: AtomicBool,
    run: Mutex<RunHandles>,
    started_tx: mpsc::Sender<()>,
    started_rx: AsyncMutex<mpsc::Receiver<()>>,
    error_tx: mpsc::Sender<ExecError>,
    error_rx: AsyncMutex<mpsc::Receiver<ExecError>>,
    op: AsyncMutex<()>,
}

impl ProcessState {
    /// Creates state for a worker that has never been started.
    ///
    /// The initial stop token and tracker are placeholders; the first Start
    /// replaces them.
    pub fn new() -> Self {
        let (started_tx, started_rx) = mpsc::channel(STARTED_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CAPACITY);
        Self {
            running: AtomicBool::new(false),
            stop_initiated: AtomicBool::new(false),
            run: Mutex::new(RunHandles {
                stop: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
            started_tx,
            started_rx: AsyncMutex::new(started_rx),
            error_tx,
            error_rx: AsyncMutex::new(error_rx),
            op: AsyncMutex::new(()),
        }
    }

    // ---- worker-facing ----

    /// Confirms startup to a pending [`start`](crate::start) call.
    ///
    /// Non-blocking; extra confirmations within one run are dropped.
    pub fn signal_started(&self) {
        let _ = self.started_tx.try_send(());
    }

    /// Reports a worker error to the orchestrator or the caller.
    ///
    /// Non-blocking and bounded; returns `false` if the buffer was full and
    /// the error was dropped.
    pub fn report_error(&self, err: ExecError) -> bool {
        self.error_tx.try_send(err).is_ok()
    }

    /// Returns the current run's stop signal.
    ///
    /// The token is a broadcast trigger: raise once, observed by every unit
    /// of the run. Bodies should poll it between units of work.
    pub fn stop_token(&self) -> CancellationToken {
        self.handles().stop.clone()
    }

    /// Returns the current run's completion barrier.
    ///
    /// Every unit spawned by the worker must be registered on it (pass it to
    /// [`spawn_supervised`](crate::spawn_supervised)) so Stop can confirm a
    /// full drain.
    pub fn tracker(&self) -> TaskTracker {
        self.handles().tracker.clone()
    }

    // ---- caller-facing ----

    /// Whether Start has been accepted and Stop has not yet completed.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the stop signal has been raised but not yet confirmed.
    pub fn stop_initiated(&self) -> bool {
        self.stop_initiated.load(Ordering::Acquire)
    }

    /// Receives the next worker error.
    ///
    /// Runtime failures after startup arrive here; the caller decides whether
    /// to Stop and restart. Returns `None` only if the worker was dropped.
    pub async fn recv_error(&self) -> Option<ExecError> {
        let mut rx = self.error_rx.lock().await;
        rx.recv().await
    }

    // ---- orchestrator-facing ----

    pub(crate) async fn recv_started(&self) -> Option<()> {
        let mut rx = self.started_rx.lock().await;
        rx.recv().await
    }

    pub(crate) async fn op_lock(&self) -> MutexGuard<'_, ()> {
        self.op.lock().await
    }

    pub(crate) fn error_sender(&self) -> mpsc::Sender<ExecError> {
        self.error_tx.clone()
    }

    /// Installs fresh per-run handles, discarding any from a previous run.
    pub(crate) fn install_run(&self, stop: CancellationToken, tracker: TaskTracker) {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        run.stop = stop;
        run.tracker = tracker;
        self.stop_initiated.store(false, Ordering::Release);
    }

    pub(crate) fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::Release);
    }

    pub(crate) fn set_stop_initiated(&self, value: bool) {
        self.stop_initiated.store(value, Ordering::Release);
    }

    fn handles(&self) -> std::sync::MutexGuard<'_, RunHandles> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProcessState {
    fn default() -> Self {
        Self::new()
    }
}
