//! # Runtime events emitted by the pipeline, its workers and the router.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Task events**: queueing, forwarding, fan-out, cancellation
//! - **Mode events**: withdraw enter/exit and result resets
//! - **Barrier events**: quiescence reached or timed out
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, stage,
//! task id/target and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use stagevisor::{Event, EventKind, Stage, Task};
//!
//! let task = Task::for_stage("vip", Stage::Soc, "/tmp/update_temp_file_2");
//! let ev = Event::new(EventKind::TaskStarting)
//!     .with_stage(Stage::Soc)
//!     .with_task(&task);
//!
//! assert_eq!(ev.kind, EventKind::TaskStarting);
//! assert_eq!(ev.task.as_deref(), Some("vip"));
//! assert_eq!(ev.target.as_deref(), Some("soc"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::{Stage, Task};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task was pushed onto a stage queue by a caller.
    ///
    /// Sets:
    /// - `stage`: queue the task was pushed onto
    /// - `task` / `target`: task id and target name
    TaskSubmitted,

    /// Router started forwarding a task to its target stage.
    ///
    /// Sets:
    /// - `stage`: target stage
    /// - `task` / `target`: task id and target name
    TaskStarting,

    /// Router created a downstream task (fan-out).
    ///
    /// Sets:
    /// - `stage`: downstream stage the new task was pushed onto
    /// - `task` / `target`: id and target of the **new** task
    TaskForwarded,

    /// Task was forwarded successfully; the stage result is now set.
    ///
    /// Sets:
    /// - `stage`: target stage
    /// - `task` / `target`: task id and target name
    /// - `elapsed_ms`: processing time
    TaskCompleted,

    /// A forwarding step failed; the stage result is left untouched.
    ///
    /// Sets:
    /// - `stage`: target stage
    /// - `task` / `target`: task id and target name
    /// - `reason`: failure message
    TaskFailed,

    /// Task was discarded without processing because withdraw mode is active.
    ///
    /// Sets:
    /// - `stage`: queue the task was discarded from
    /// - `task` / `target`: task id and target name
    TaskCancelled,

    /// Task addressed an unknown stage and was dropped.
    ///
    /// Sets:
    /// - `stage`: queue the task was taken from
    /// - `task` / `target`: task id and the unknown target name
    /// - `reason`: `"unknown_target"`
    TaskDropped,

    // === Mode events ===
    /// Withdraw mode was switched on.
    WithdrawEntered,

    /// Withdraw mode was switched off.
    WithdrawExited,

    /// All stage results were reset for a new cycle.
    ResultsReset,

    // === Barrier events ===
    /// Every stage queue drained within the budget.
    ///
    /// Sets:
    /// - `elapsed_ms`: time spent waiting
    /// - `timeout_ms`: the budget
    QuiescenceReached,

    /// The budget ran out while a queue was still non-empty.
    ///
    /// Sets:
    /// - `stage`: first stage found non-empty at the deadline
    /// - `timeout_ms`: the budget
    QuiescenceTimeout,

    // === Runtime events ===
    /// Shutdown requested (OS signal, end of input or explicit call).
    ShutdownRequested,

    /// All stage workers exited.
    WorkersStopped,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> reason=<full|closed>`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> panic=<info>`
    SubscriberPanicked,

    /// The event listener fell behind the bus and lost events.
    ///
    /// Delivered to subscribers only, never published on the bus.
    ///
    /// Sets:
    /// - `reason`: `skipped=<n>`
    EventsLagged,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Stage the event is about.
    pub stage: Option<Stage>,
    /// Task id, if applicable.
    pub task: Option<Arc<str>>,
    /// Task target name, if applicable.
    pub target: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Budget of a barrier call in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Measured duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stage: None,
            task: None,
            target: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a stage.
    #[inline]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attaches the id and target of a task.
    #[inline]
    pub fn with_task(mut self, task: &Task) -> Self {
        self.task = Some(Arc::from(task.id()));
        self.target = Some(Arc::from(task.target()));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a barrier budget (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a measured duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    /// Creates the notice sent to subscribers when `skipped` bus events were lost.
    #[inline]
    pub fn events_lagged(skipped: u64) -> Self {
        Event::new(EventKind::EventsLagged).with_reason(format!("skipped={skipped}"))
    }

    /// True if the event is about `task` (same id and target).
    pub fn is_about(&self, task: &Task) -> bool {
        self.task.as_deref() == Some(task.id()) && self.target.as_deref() == Some(task.target())
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
