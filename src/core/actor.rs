//! # StageWorker: the single consumer of one stage queue.
//!
//! One worker per stage, spawned by the pipeline builder and running until the
//! runtime token is cancelled.
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► runtime_token cancelled? ─► exit
//!   ├─► withdraw on?
//!   │     ├─► drain queue ─► TaskCancelled per task (router never sees them)
//!   │     └─► idle (withdraw_idle | push | mode change | cancel)
//!   └─► normal:
//!         ├─► queue empty ─► park (push | mode change | cancel)
//!         └─► peek head ─► Router::route(head) ─► remove head
//! }
//! ```
//!
//! ## Rules
//! - Mode is read at the **top of every iteration**; a task already inside the
//!   router is never interrupted.
//! - The head stays queued while it is routed (see `queue` module docs).
//! - After every wake the queue is re-checked under its lock.
//! - Tasks are processed strictly in push order.

use std::{sync::Arc, time::Duration};

use tokio::{select, sync::watch, time};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    core::{
        queue::StageQueue,
        router::{RouteOutcome, Router},
    },
    events::{Bus, Event, EventKind},
    tasks::Stage,
};

/// What woke a parked worker.
enum Wake {
    /// Push, mode change or idle timer: go round again.
    Recheck,
    /// Runtime cancelled or pipeline gone.
    Exit,
}

/// Drives one stage queue.
pub(crate) struct StageWorker {
    stage: Stage,
    queue: Arc<StageQueue>,
    router: Arc<Router>,
    withdraw: watch::Receiver<bool>,
    bus: Bus,
    idle: Duration,
}

impl StageWorker {
    pub(crate) fn new(
        queue: Arc<StageQueue>,
        router: Arc<Router>,
        withdraw: watch::Receiver<bool>,
        bus: Bus,
        idle: Duration,
    ) -> Self {
        Self {
            stage: queue.stage(),
            queue,
            router,
            withdraw,
            bus,
            idle,
        }
    }

    /// Runs until `runtime_token` is cancelled.
    ///
    /// Cancellation is observed while parked and between tasks; a task being
    /// routed finishes first.
    pub(crate) async fn run(mut self, runtime_token: CancellationToken) {
        loop {
            if runtime_token.is_cancelled() {
                break;
            }

            let withdrawing = *self.withdraw.borrow_and_update();
            if withdrawing {
                self.cancel_queued();
                match self.idle(&runtime_token).await {
                    Wake::Recheck => continue,
                    Wake::Exit => break,
                }
            }

            let Some(task) = self.queue.peek() else {
                match self.park(&runtime_token).await {
                    Wake::Recheck => continue,
                    Wake::Exit => break,
                }
            };

            let outcome = self.router.route(self.stage, &task).await;
            self.queue.remove_head();
            match outcome {
                RouteOutcome::Completed { spawned } if spawned > 0 => {
                    debug!(stage = %self.stage, task = task.id(), spawned, "fan-out queued");
                }
                _ => {}
            }
        }
    }

    /// Discards everything queued, reporting each task as cancelled.
    fn cancel_queued(&self) {
        for task in self.queue.drain() {
            self.bus.publish(
                Event::new(EventKind::TaskCancelled)
                    .with_stage(self.stage)
                    .with_task(&task),
            );
        }
    }

    /// Waits on an empty queue in normal mode.
    async fn park(&mut self, runtime_token: &CancellationToken) -> Wake {
        select! {
            _ = self.queue.notified() => Wake::Recheck,
            changed = self.withdraw.changed() => match changed {
                Ok(()) => Wake::Recheck,
                Err(_) => Wake::Exit,
            },
            _ = runtime_token.cancelled() => Wake::Exit,
        }
    }

    /// Waits between two drains in withdraw mode.
    async fn idle(&mut self, runtime_token: &CancellationToken) -> Wake {
        select! {
            _ = time::sleep(self.idle) => Wake::Recheck,
            _ = self.queue.notified() => Wake::Recheck,
            changed = self.withdraw.changed() => match changed {
                Ok(()) => Wake::Recheck,
                Err(_) => Wake::Exit,
            },
            _ = runtime_token.cancelled() => Wake::Exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{registry::StageRegistry, withdraw::WithdrawSignal},
        routing::{RouteTable, SimulatedLink},
        tasks::{MOUNT_LATENCY, Task},
    };
    use tokio::time::Instant;

    struct Harness {
        registry: Arc<StageRegistry>,
        withdraw: WithdrawSignal,
        token: CancellationToken,
        bus: Bus,
    }

    fn spawn_soc_worker() -> (Harness, tokio::task::JoinHandle<()>) {
        let registry = Arc::new(StageRegistry::new());
        let bus = Bus::new(64);
        let router = Arc::new(Router::new(
            registry.clone(),
            RouteTable::standard(),
            Arc::new(SimulatedLink),
            bus.clone(),
        ));
        let withdraw = WithdrawSignal::new();
        let token = CancellationToken::new();
        let worker = StageWorker::new(
            registry.queue(Stage::Soc).clone(),
            router,
            withdraw.subscribe(),
            bus.clone(),
            Duration::from_secs(1),
        );
        let handle = tokio::spawn(worker.run(token.child_token()));
        (
            Harness {
                registry,
                withdraw,
                token,
                bus,
            },
            handle,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_routes_head_and_hands_off_fan_out() {
        let (h, handle) = spawn_soc_worker();
        let soc = h.registry.queue(Stage::Soc);

        let started = Instant::now();
        soc.push(Task::for_stage("rootfs", Stage::Soc, "/tmp/update_temp_file_4"));
        while !soc.is_empty() {
            time::sleep(Duration::from_millis(100)).await;
        }

        assert!(started.elapsed() >= Stage::Soc.transfer_latency() + MOUNT_LATENCY);
        assert!(soc.is_completed());
        assert_eq!(h.registry.queue(Stage::Switch).len(), 1);

        h.token.cancel();
        handle.await.expect("worker exits");
    }

    #[tokio::test(start_paused = true)]
    async fn test_withdrawing_worker_cancels_instead_of_routing() {
        let (h, handle) = spawn_soc_worker();
        let mut rx = h.bus.subscribe();

        h.withdraw.enter();
        h.registry
            .queue(Stage::Soc)
            .push(Task::for_stage("vip", Stage::Soc, ""));

        let ev = rx.recv().await.expect("cancel event");
        assert_eq!(ev.kind, EventKind::TaskCancelled);
        assert!(h.registry.queue(Stage::Soc).is_empty());
        assert!(!h.registry.any_completed());

        h.token.cancel();
        handle.await.expect("worker exits");
    }
}
