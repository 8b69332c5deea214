//! # Executor contract: the capability set a controllable worker exposes.
//!
//! [`Executor`] is the interface a worker implements to be driven by the
//! generic [`start`](crate::start)/[`stop`](crate::stop) operations: an
//! asynchronous body, a way to report startup success or failure, and a way
//! to be stopped — all expressed through an embedded [`ProcessState`].
//!
//! [`Cancel`] is an optional extra capability: best-effort forced
//! termination for workers whose graceful Stop can get stuck. Workers opt in
//! by overriding [`Executor::as_cancel`].
//!
//! ## Rules for `execute`
//! - Perform setup first; return `Err` **instead of** confirming startup if
//!   setup fails.
//! - Spawn every nested unit with [`spawn_supervised`](crate::spawn_supervised),
//!   registered on [`ProcessState::tracker`] and routed to the failure channel.
//! - Confirm startup with [`ProcessState::signal_started`] once ready.
//! - Poll [`ProcessState::stop_token`] between units of work and exit
//!   promptly when it fires.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ExecError;
use crate::panics::PanicCapsule;
use crate::process::state::ProcessState;

/// Open, caller-defined key/value bag passed opaquely through Start to the
/// worker's body. The core never interprets any key.
pub type Settings = HashMap<String, serde_json::Value>;

/// Shared handle to a controllable worker.
pub type ExecutorRef = Arc<dyn Executor>;

/// # A worker controllable by the generic Start/Stop operations.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio::sync::mpsc;
/// use procvisor::{ExecError, Executor, PanicCapsule, ProcessState, Settings};
///
/// #[derive(Default)]
/// struct Agent {
///     state: ProcessState,
/// }
///
/// #[async_trait]
/// impl Executor for Agent {
///     async fn execute(
///         &self,
///         _settings: Settings,
///         _panics: mpsc::Sender<PanicCapsule>,
///     ) -> Result<(), ExecError> {
///         let stop = self.state.stop_token();
///         self.state.signal_started();
///         stop.cancelled().await;
///         Ok(())
///     }
///
///     fn state(&self) -> &ProcessState {
///         &self.state
///     }
/// }
/// ```
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// The asynchronous body, run under supervision by [`start`](crate::start).
    ///
    /// Invoked at most once per run. A returned `Err` before
    /// [`ProcessState::signal_started`] is surfaced synchronously from
    /// `start`; a returned `Err` afterwards is delivered on the worker's
    /// error channel (see [`ProcessState::recv_error`]).
    async fn execute(
        &self,
        settings: Settings,
        panics: mpsc::Sender<PanicCapsule>,
    ) -> Result<(), ExecError>;

    /// Accessor bundle the orchestrator drives the state machine through.
    fn state(&self) -> &ProcessState;

    /// Opt-in forced-cancel capability; `None` means graceful Stop only.
    fn as_cancel(&self) -> Option<&dyn Cancel> {
        None
    }
}

/// Best-effort forced termination.
///
/// An escalation path for when graceful Stop exceeds its budget: must not
/// block, and makes no drain guarantee.
pub trait Cancel: Send + Sync {
    /// Requests immediate, non-blocking termination of in-flight work.
    fn cancel(&self);
}
