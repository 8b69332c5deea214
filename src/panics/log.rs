//! # Simple capsule drain for debugging and demos.
//!
//! [`PanicLogger`] consumes a failure channel and prints each capsule to
//! stdout in a human-readable format. The failure channel must be drained
//! for the lifetime of the process; this is the smallest possible reader.
//!
//! ## Output format
//! ```text
//! [panic] worker hit an index out of bounds
//!                               agent::run_loop src/agent.rs:42
//!                                    task::poll task/raw.rs:77
//! ```
//!
//! Not intended for production use; route capsules into your own logging
//! or alerting instead.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::panics::capsule::PanicCapsule;

/// Stdout drain for a [`PanicCapsule`] channel.
///
/// Enabled via the `logging` feature.
pub struct PanicLogger;

impl PanicLogger {
    /// Spawns a task that prints every capsule until the channel closes.
    pub fn spawn(mut rx: mpsc::Receiver<PanicCapsule>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(capsule) = rx.recv().await {
                println!("[panic] {}", capsule.payload_message());
                for line in capsule.stack_trace().lines() {
                    println!("{line}");
                }
            }
        })
    }
}
