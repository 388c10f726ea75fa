//! # Link: the physical side of forwarding.
//!
//! The router decides *what* happens to a task; a [`Link`]
//! performs the actual transfer to a stage and the mount step before fan-out.
//! [`SimulatedLink`] stands in for real devices by sleeping for the fixed
//! per-stage latency.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;
use tracing::debug;

use crate::error::LinkError;
use crate::tasks::{MOUNT_LATENCY, Stage, Task};

/// Shared handle to a link implementation.
pub type LinkRef = Arc<dyn Link>;

/// # Transport used by the router.
///
/// Calls for one stage are strictly sequential (one worker per stage); calls
/// for different stages may run concurrently.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use stagevisor::{Link, LinkError, Stage, Task};
///
/// struct Instant;
///
/// #[async_trait]
/// impl Link for Instant {
///     async fn transfer(&self, _stage: Stage, _task: &Task) -> Result<(), LinkError> {
///         Ok(())
///     }
///     async fn mount(&self, _stage: Stage, _task: &Task) -> Result<(), LinkError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Link: Send + Sync + 'static {
    /// Transfers `task` to the device behind `stage`.
    async fn transfer(&self, stage: Stage, task: &Task) -> Result<(), LinkError>;

    /// Mounts a transferred packet on `stage` so it can be handed downstream.
    async fn mount(&self, stage: Stage, task: &Task) -> Result<(), LinkError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Link that simulates transfer latency with timed delays.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedLink;

#[async_trait]
impl Link for SimulatedLink {
    async fn transfer(&self, stage: Stage, task: &Task) -> Result<(), LinkError> {
        time::sleep(stage.transfer_latency()).await;
        if stage == Stage::Soc {
            debug!(task = task.id(), "relayed to soc1 and soc2");
        }
        Ok(())
    }

    async fn mount(&self, stage: Stage, task: &Task) -> Result<(), LinkError> {
        time::sleep(MOUNT_LATENCY).await;
        debug!(stage = stage.as_str(), task = task.id(), "mounted on soc1");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_latency_per_stage() {
        let link = SimulatedLink;
        let task = Task::for_stage("vip", Stage::Vip, "");
        for stage in Stage::ALL {
            let started = Instant::now();
            link.transfer(stage, &task).await.expect("simulated transfer");
            assert_eq!(started.elapsed(), stage.transfer_latency());
        }

        let started = Instant::now();
        link.mount(Stage::Soc, &task).await.expect("simulated mount");
        assert_eq!(started.elapsed(), MOUNT_LATENCY);
    }
}
