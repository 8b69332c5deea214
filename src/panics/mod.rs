//! # Panic capture: capsules and stack-trace rendering.
//!
//! This module provides the failure-side types for supervised spawning:
//! - [`PanicCapsule`] — captured panic payload + condensed stack trace
//! - [`render_stack_trace`] — the diagnostic condenser (never fails)
//! - `PanicLogger` — feature-gated stdout drain (`logging`)

mod capsule;
mod trace;

#[cfg(feature = "logging")]
mod log;

pub use capsule::PanicCapsule;
pub use trace::render_stack_trace;

pub(crate) use trace::{install_capture_hook, take_captured_trace};

#[cfg(feature = "logging")]
pub use log::PanicLogger;
