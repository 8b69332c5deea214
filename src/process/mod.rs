//! # Worker-side abstractions.
//!
//! This module provides the contract between a worker and the orchestrator:
//! - [`Executor`] - trait a controllable worker implements
//! - [`Cancel`] - optional forced-termination capability
//! - [`ProcessState`] - per-worker channels, flags, and per-run handles
//! - [`Settings`] - opaque configuration bag
//! - [`ExecutorRef`] - shared worker handle (`Arc<dyn Executor>`)

mod executor;
mod state;

pub use executor::{Cancel, Executor, ExecutorRef, Settings};
pub use state::ProcessState;
