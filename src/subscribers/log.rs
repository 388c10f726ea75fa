//! # LogWriter: renders events as `tracing` records
//!
//! The pipeline never logs directly; every transition is an [`Event`], and this
//! subscriber turns events into log lines. Install any `tracing` subscriber in
//! the binary to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO stagevisor: packet queued stage="soc" task="vip" dest="soc"
//! INFO stagevisor: forwarding packet stage="soc" task="vip"
//! INFO stagevisor: downstream task created stage="vip" task="vip"
//! INFO stagevisor: packet forwarded stage="soc" task="vip" elapsed_ms=2000
//! INFO stagevisor: task cancelled stage="sail" task="sail"
//! WARN stagevisor: quiescence timeout stage="switch" timeout_ms=30000
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const NONE: &str = "-";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let stage = e.stage.map(|s| s.as_str()).unwrap_or(NONE);
        let task = e.task.as_deref().unwrap_or(NONE);
        let dest = e.target.as_deref().unwrap_or(NONE);
        let reason = e.reason.as_deref().unwrap_or(NONE);

        match e.kind {
            EventKind::TaskSubmitted => {
                info!(stage, task, dest, "packet queued");
            }
            EventKind::TaskStarting => {
                info!(stage, task, "forwarding packet");
            }
            EventKind::TaskForwarded => {
                info!(stage, task, "downstream task created");
            }
            EventKind::TaskCompleted => {
                info!(stage, task, elapsed_ms = ?e.elapsed_ms, "packet forwarded");
            }
            EventKind::TaskFailed => {
                warn!(stage, task, reason, "packet forwarding failed");
            }
            EventKind::TaskCancelled => {
                info!(stage, task, dest, "task cancelled");
            }
            EventKind::TaskDropped => {
                warn!(stage, task, dest, "unknown target stage; packet dropped");
            }
            EventKind::WithdrawEntered => {
                info!("withdraw mode entered");
            }
            EventKind::WithdrawExited => {
                info!("withdraw mode exited");
            }
            EventKind::ResultsReset => {
                info!("stage results reset");
            }
            EventKind::QuiescenceReached => {
                info!(elapsed_ms = ?e.elapsed_ms, "all stage queues drained");
            }
            EventKind::QuiescenceTimeout => {
                warn!(stage, timeout_ms = ?e.timeout_ms, "quiescence timeout");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::WorkersStopped => {
                info!("stage workers stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(reason, "subscriber panicked");
            }
            EventKind::EventsLagged => {
                warn!(reason, "event listener lagged; log lines lost");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
