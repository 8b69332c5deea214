//! # Lifecycle orchestration.
//!
//! Generic Start/Stop operations that drive any [`Executor`](crate::Executor)
//! through the controlled state machine, with bounded waits from
//! [`LifecycleConfig`](crate::LifecycleConfig).

mod orchestrator;

pub use orchestrator::{start, start_with, stop, stop_or_cancel, stop_with};
