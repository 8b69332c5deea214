//! Error types used by the procvisor lifecycle and workers.
//!
//! This module defines [`ExecError`], the single error enum shared by the
//! orchestrator and worker implementations, plus classification predicates
//! for the two protocol-misuse sentinels.
//!
//! ## Taxonomy
//! - **Protocol misuse**: [`ExecError::AlreadyStarted`], [`ExecError::AlreadyStopped`] —
//!   returned without side effects when Start/Stop is called in the wrong state.
//! - **Timeouts**: [`ExecError::StartTimeout`], [`ExecError::StopTimeout`] —
//!   a bounded wait expired; state is left consistent for a retry.
//! - **Worker failures**: [`ExecError::Setup`] (synchronous, before startup was
//!   confirmed) and [`ExecError::Runtime`] (asynchronous, on the error channel).
//!
//! ## Classification
//! Callers may wrap an [`ExecError`] with added context before handing it on.
//! The free functions [`is_already_started`] and [`is_already_stopped`] therefore
//! classify by walking the `source()` chain and downcasting, not by comparing a
//! top-level value.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the lifecycle orchestrator and by workers.
///
/// All orchestration failures are ordinary returned errors; only unrecoverable
/// panics travel out-of-band as [`PanicCapsule`](crate::PanicCapsule)s.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecError {
    /// Start was called while the worker is already running.
    #[error("process is already started, cannot start")]
    AlreadyStarted,

    /// Stop was called while the worker is not running.
    #[error("process is not running, cannot stop")]
    AlreadyStopped,

    /// The worker did not confirm startup within the budget.
    #[error("timed out after {timeout:?} waiting for process to start")]
    StartTimeout {
        /// The configured startup budget.
        timeout: Duration,
    },

    /// Spawned units did not drain the completion barrier within the budget.
    #[error("timed out after {timeout:?} waiting for process to shut down")]
    StopTimeout {
        /// The configured shutdown budget.
        timeout: Duration,
    },

    /// Worker setup failed before startup was confirmed.
    #[error("setup failed: {error}")]
    Setup {
        /// The underlying error message.
        error: String,
    },

    /// Worker failed after startup succeeded.
    #[error("execution failed: {error}")]
    Runtime {
        /// The underlying error message.
        error: String,
    },
}

impl ExecError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::ExecError;
    ///
    /// assert_eq!(ExecError::AlreadyStarted.as_label(), "exec_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecError::AlreadyStarted => "exec_already_started",
            ExecError::AlreadyStopped => "exec_already_stopped",
            ExecError::StartTimeout { .. } => "exec_start_timeout",
            ExecError::StopTimeout { .. } => "exec_stop_timeout",
            ExecError::Setup { .. } => "exec_setup_failed",
            ExecError::Runtime { .. } => "exec_runtime_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ExecError::AlreadyStarted => "already started".to_string(),
            ExecError::AlreadyStopped => "not running".to_string(),
            ExecError::StartTimeout { timeout } => format!("start timeout: {timeout:?}"),
            ExecError::StopTimeout { timeout } => format!("stop timeout: {timeout:?}"),
            ExecError::Setup { error } => format!("setup: {error}"),
            ExecError::Runtime { error } => format!("runtime: {error}"),
        }
    }

    /// True for the "Start while running" sentinel.
    pub fn is_already_started(&self) -> bool {
        matches!(self, ExecError::AlreadyStarted)
    }

    /// True for the "Stop while stopped" sentinel.
    pub fn is_already_stopped(&self) -> bool {
        matches!(self, ExecError::AlreadyStopped)
    }

    /// True when a Start or Stop wait expired.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ExecError::StartTimeout { .. } | ExecError::StopTimeout { .. }
        )
    }
}

/// Classifies an error (possibly wrapped with context) as [`ExecError::AlreadyStarted`].
///
/// Walks the `source()` chain so callers can wrap the sentinel freely.
///
/// # Example
/// ```
/// use procvisor::{is_already_started, ExecError};
///
/// let err = ExecError::AlreadyStarted;
/// assert!(is_already_started(&err));
/// assert!(!is_already_started(&ExecError::AlreadyStopped));
/// ```
pub fn is_already_started(err: &(dyn StdError + 'static)) -> bool {
    classify(err, ExecError::is_already_started)
}

/// Classifies an error (possibly wrapped with context) as [`ExecError::AlreadyStopped`].
pub fn is_already_stopped(err: &(dyn StdError + 'static)) -> bool {
    classify(err, ExecError::is_already_stopped)
}

fn classify(err: &(dyn StdError + 'static), pred: fn(&ExecError) -> bool) -> bool {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(exec) = e.downcast_ref::<ExecError>() {
            if pred(exec) {
                return true;
            }
        }
        cur = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug)]
    #[error("while stopping the agent")]
    struct Wrapped {
        #[source]
        inner: ExecError,
    }

    #[test]
    fn test_sentinels_classify_directly() {
        assert!(is_already_started(&ExecError::AlreadyStarted));
        assert!(is_already_stopped(&ExecError::AlreadyStopped));
        assert!(!is_already_started(&ExecError::AlreadyStopped));
        assert!(!is_already_stopped(&ExecError::AlreadyStarted));
    }

    #[test]
    fn test_sentinels_classify_through_wrapping() {
        let err = Wrapped {
            inner: ExecError::AlreadyStopped,
        };
        assert!(is_already_stopped(&err));
        assert!(!is_already_started(&err));
    }

    #[test]
    fn test_non_sentinel_errors_do_not_classify() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(!is_already_started(&err));
        assert!(!is_already_stopped(&err));
    }

    #[test]
    fn test_labels_are_stable() {
        let err = ExecError::StartTimeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.as_label(), "exec_start_timeout");
        assert!(err.is_timeout());
        assert!(err.as_message().contains("1s"));
    }
}
