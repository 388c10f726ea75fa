//! # Quiescence barrier.
//!
//! Polls stage queues until all are empty or a **shared** time budget runs out.
//!
//! ```text
//! started = now
//! for stage in Stage::ALL:           (soc, sail, vip, switch)
//!   while !queue(stage).is_empty():
//!     if now - started >= timeout ─► Err(stage)   (remaining stages unchecked)
//!     sleep(poll)
//! Ok(now - started)
//! ```
//!
//! The deadline is computed once, so later stages get whatever budget the
//! earlier ones left. A stage already passed is not re-checked; work fanned out
//! into it afterwards is only caught if its producer was still queued at the time.
//!
//! Never waits on a condition: only bounded sleeps. Says nothing about router
//! work that has already left its queue.

use std::time::Duration;

use tokio::time::{self, Instant};

use crate::{core::registry::StageRegistry, tasks::Stage};

/// Waits until every queue in `registry` is empty.
///
/// Returns the time spent, or the first stage still non-empty at the deadline.
/// Fails no later than `timeout + poll`.
pub(crate) async fn wait_all_quiescent(
    registry: &StageRegistry,
    timeout: Duration,
    poll: Duration,
) -> Result<Duration, Stage> {
    let started = Instant::now();

    for queue in registry.iter() {
        while !queue.is_empty() {
            if started.elapsed() >= timeout {
                return Err(queue.stage());
            }
            time::sleep(poll).await;
        }
    }
    Ok(started.elapsed())
}
