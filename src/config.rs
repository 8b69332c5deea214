//! Lifecycle timing configuration.
//!
//! [`LifecycleConfig`] carries the two independent wait budgets used by the
//! orchestrator: how long [`start_with`](crate::start_with) waits for a startup
//! confirmation and how long [`stop_with`](crate::stop_with) waits for the
//! completion barrier to drain.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use procvisor::LifecycleConfig;
//!
//! let mut cfg = LifecycleConfig::default();
//! cfg.start_timeout = Duration::from_secs(10);
//! cfg.stop_timeout = Duration::from_secs(30);
//!
//! assert_eq!(cfg.start_timeout, Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Wait budgets for the Start/Stop operations.
///
/// The two budgets are independent: a worker that is quick to start may still
/// need a long drain window, and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Maximum time to wait for the worker's startup confirmation.
    pub start_timeout: Duration,
    /// Maximum time to wait for all spawned units to drain on Stop.
    pub stop_timeout: Duration,
}

impl Default for LifecycleConfig {
    /// Provides the reference budgets:
    /// - `start_timeout = 120s`
    /// - `stop_timeout = 120s`
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(120),
            stop_timeout: Duration::from_secs(120),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_two_minutes() {
        let cfg = LifecycleConfig::default();
        assert_eq!(cfg.start_timeout, Duration::from_secs(120));
        assert_eq!(cfg.stop_timeout, Duration::from_secs(120));
    }
}
