//! # procvisor
//!
//! **Procvisor** is a small supervision layer for long-running background
//! workers: a panic-capturing spawn primitive plus a generic start/stop
//! protocol that turns an arbitrary worker into a controllable, idempotent,
//! timeout-bounded process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  caller ──► start(worker, settings, panics) ─────────────────────────┐
//!                 │                                                    │
//!                 ├─► fresh TaskTracker (completion barrier)           │
//!                 ├─► fresh CancellationToken (stop signal)            │
//!                 ▼                                                    │
//!          spawn_supervised(execute body)                              │
//!                 │                   │                                │
//!                 │                   ├─► nested units, each           │
//!                 │                   │   spawn_supervised on the      │
//!                 │                   │   same tracker + panics chan   │
//!                 │                   ▼                                │
//!                 │            signal_started() ──────────────────────►│
//!                 │                                                    ▼
//!                 │                               Ok / worker error / timeout
//!                 │
//!                 └─ panic in any unit ──► PanicCapsule ──► panics channel
//!                        (barrier released first, child scope cancelled)
//!
//!  caller ──► stop(worker)
//!                 ├─► raise stop signal exactly once (idempotent)
//!                 └─► wait: barrier drained  ──► Stopped
//!                           budget exceeded ──► StopTimeout (still running,
//!                                               retry or stop_or_cancel)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Stopped ──► Starting ──► Running ──► Stopping ──► Stopped
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / functions                    |
//! |-----------------|----------------------------------------------------------|------------------------------------------|
//! | **Spawn**       | Panic-capturing replacement for bare `tokio::spawn`.     | [`spawn_supervised`], [`SpawnOptions`]   |
//! | **Failures**    | Captured panic payload + condensed stack trace.          | [`PanicCapsule`], [`render_stack_trace`] |
//! | **Contract**    | Capability set a controllable worker implements.         | [`Executor`], [`Cancel`], [`ProcessState`] |
//! | **Lifecycle**   | Generic Start/Stop with bounded waits.                   | [`start`], [`stop`], [`stop_or_cancel`]  |
//! | **Errors**      | Sentinel taxonomy with wrap-tolerant classification.     | [`ExecError`], [`is_already_started`]    |
//! | **Configuration** | Independent startup/shutdown budgets.                  | [`LifecycleConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `PanicLogger` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tokio::sync::mpsc;
//! use procvisor::{ExecError, Executor, ExecutorRef, PanicCapsule, ProcessState, Settings};
//!
//! #[derive(Default)]
//! struct Agent {
//!     state: ProcessState,
//! }
//!
//! #[async_trait]
//! impl Executor for Agent {
//!     async fn execute(
//!         &self,
//!         _settings: Settings,
//!         _panics: mpsc::Sender<PanicCapsule>,
//!     ) -> Result<(), ExecError> {
//!         let stop = self.state.stop_token();
//!         // ...setup would go here; return Err instead of signalling on failure.
//!         self.state.signal_started();
//!         stop.cancelled().await;
//!         Ok(())
//!     }
//!
//!     fn state(&self) -> &ProcessState {
//!         &self.state
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ExecError> {
//!     // The failure channel must stay drained for the life of the process;
//!     // give it enough buffer that delivery never stalls shutdown.
//!     let (panics_tx, _panics_rx) = mpsc::channel(128);
//!
//!     let worker: ExecutorRef = std::sync::Arc::new(Agent::default());
//!
//!     procvisor::start(&worker, Settings::new(), panics_tx).await?;
//!     assert!(worker.state().is_running());
//!
//!     procvisor::stop(&worker).await?;
//!     assert!(!worker.state().is_running());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod lifecycle;
mod panics;
mod process;
mod spawn;

// ---- Public re-exports ----

pub use config::LifecycleConfig;
pub use error::{is_already_started, is_already_stopped, ExecError};
pub use lifecycle::{start, start_with, stop, stop_or_cancel, stop_with};
pub use panics::{render_stack_trace, PanicCapsule};
pub use process::{Cancel, Executor, ExecutorRef, ProcessState, Settings};
pub use spawn::{spawn_supervised, SpawnOptions};

// Optional: expose a simple built-in capsule drain (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use panics::PanicLogger;
