//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for the pipeline runtime.
//!
//! Config is used in two places:
//! 1. **Engine creation**: `Pipeline::builder(config)`
//! 2. **Commands**: `start` / `query` drain with [`Config::barrier_timeout`]
//!
//! Per-stage transfer latencies are **not** configurable; they are fixed on
//! [`Stage`](crate::Stage).

use std::time::Duration;

/// Lower bound for every polling/idle interval (guards against a zero busy loop).
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Global configuration for the pipeline runtime.
///
/// ## Field semantics
/// - `barrier_timeout`: shared budget for one quiescence wait (`start`, `query`)
/// - `poll_interval`: how often the barrier re-checks a non-empty queue
/// - `withdraw_idle`: how long a withdrawing worker idles between drains
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long shutdown waits for workers before aborting them
#[derive(Clone, Debug)]
pub struct Config {
    /// Overall time budget of one quiescence barrier call.
    pub barrier_timeout: Duration,

    /// Interval between two emptiness checks of the same queue.
    ///
    /// A barrier with timeout `T` reports failure no later than `T + poll_interval`.
    pub poll_interval: Duration,

    /// Idle time of a worker in withdraw mode between two drains of its queue.
    pub withdraw_idle: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Maximum time to wait for stage workers to exit on shutdown.
    pub grace: Duration,
}

impl Config {
    /// Returns the poll interval, never shorter than 1ms.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(MIN_INTERVAL)
    }

    /// Returns the withdraw idle interval, never shorter than 1ms.
    #[inline]
    pub fn withdraw_idle_clamped(&self) -> Duration {
        self.withdraw_idle.max(MIN_INTERVAL)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `barrier_timeout = 30s`
    /// - `poll_interval = 200ms`
    /// - `withdraw_idle = 1s`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            barrier_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(200),
            withdraw_idle: Duration::from_secs(1),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
