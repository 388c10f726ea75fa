//! # Router: forwards one task and fans it out.
//!
//! Executes the work of one task on behalf of a stage worker and publishes
//! lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Unknown target:
//!   parse(target) ✗ ─► TaskDropped
//!
//! Success:
//!   TaskStarting ─► link.transfer()
//!                ─► for each downstream stage:
//!                     link.mount() ─► TaskForwarded ─► push retargeted task
//!                ─► result[target] = true ─► TaskCompleted
//!
//! Failure (transfer or mount):
//!   TaskStarting ─► ... ─► TaskFailed   (result untouched, no further fan-out)
//! ```
//!
//! ## Rules
//! - Dispatch is on the task's `target`, not on the queue it came from.
//! - Only the target stage's result flag is written.
//! - Fan-out is a push onto the downstream queue; the downstream worker does the rest.
//! - Publishes **exactly one** terminal event per call.
//! - Events announcing a push go out before the push, so a woken worker can never
//!   report a task ahead of its arrival.

use std::sync::Arc;

use tokio::time::Instant;

use crate::{
    core::registry::StageRegistry,
    error::LinkError,
    events::{Bus, Event, EventKind},
    routing::{LinkRef, RouteTable},
    tasks::{Stage, Task},
};

/// Result of routing one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteOutcome {
    /// Forwarded; `spawned` downstream tasks were created.
    Completed { spawned: usize },
    /// A link step failed.
    Failed,
    /// Target stage unknown; nothing happened.
    Dropped,
}

/// Stateless forwarding logic shared by all stage workers.
pub(crate) struct Router {
    registry: Arc<StageRegistry>,
    routes: RouteTable,
    link: LinkRef,
    bus: Bus,
}

impl Router {
    pub(crate) fn new(
        registry: Arc<StageRegistry>,
        routes: RouteTable,
        link: LinkRef,
        bus: Bus,
    ) -> Self {
        Self {
            registry,
            routes,
            link,
            bus,
        }
    }

    /// Processes `task`, taken from the queue of `from`.
    pub(crate) async fn route(&self, from: Stage, task: &Task) -> RouteOutcome {
        let Ok(target) = task.stage() else {
            self.bus.publish(
                Event::new(EventKind::TaskDropped)
                    .with_stage(from)
                    .with_task(task)
                    .with_reason("unknown_target"),
            );
            return RouteOutcome::Dropped;
        };

        let started = Instant::now();
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_stage(target)
                .with_task(task),
        );

        match self.forward(target, task).await {
            Ok(spawned) => {
                self.registry.queue(target).set_completed(true);
                self.bus.publish(
                    Event::new(EventKind::TaskCompleted)
                        .with_stage(target)
                        .with_task(task)
                        .with_elapsed(started.elapsed()),
                );
                RouteOutcome::Completed { spawned }
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_stage(target)
                        .with_task(task)
                        .with_reason(e.to_string()),
                );
                RouteOutcome::Failed
            }
        }
    }

    /// Transfers `task` to `target`, then mounts and hands it to every downstream stage.
    async fn forward(&self, target: Stage, task: &Task) -> Result<usize, LinkError> {
        self.link.transfer(target, task).await?;

        let mut spawned = 0;
        for next in self.routes.downstream(target, task.id()) {
            self.link.mount(target, task).await?;

            let child = task.retarget(next);
            self.bus.publish(
                Event::new(EventKind::TaskForwarded)
                    .with_stage(next)
                    .with_task(&child),
            );
            self.registry.queue(next).push(child);
            spawned += 1;
        }
        Ok(spawned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{IdPattern, Link, SimulatedLink};
    use async_trait::async_trait;

    struct Refuse(Stage);

    #[async_trait]
    impl Link for Refuse {
        async fn transfer(&self, stage: Stage, _task: &Task) -> Result<(), LinkError> {
            if stage == self.0 {
                return Err(LinkError::Unreachable {
                    stage,
                    error: "no carrier".into(),
                });
            }
            Ok(())
        }
        async fn mount(&self, _stage: Stage, _task: &Task) -> Result<(), LinkError> {
            Ok(())
        }
    }

    fn router(link: LinkRef, routes: RouteTable) -> (Router, Arc<StageRegistry>, Bus) {
        let registry = Arc::new(StageRegistry::new());
        let bus = Bus::new(64);
        (
            Router::new(registry.clone(), routes, link, bus.clone()),
            registry,
            bus,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_soc_fans_out_one_retargeted_task() {
        let (router, registry, _bus) = router(Arc::new(SimulatedLink), RouteTable::standard());
        let task = Task::for_stage("rootfs", Stage::Soc, "/tmp/update_temp_file_4");

        let started = Instant::now();
        let outcome = router.route(Stage::Soc, &task).await;

        assert_eq!(outcome, RouteOutcome::Completed { spawned: 1 });
        assert_eq!(
            started.elapsed(),
            Stage::Soc.transfer_latency() + crate::tasks::MOUNT_LATENCY
        );
        assert!(registry.queue(Stage::Soc).is_completed());
        assert_eq!(registry.queue(Stage::Switch).drain(), vec![task.retarget(Stage::Switch)]);
        assert!(registry.queue(Stage::Sail).is_empty());
        assert!(registry.queue(Stage::Vip).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_packet_does_not_fan_out() {
        let (router, registry, _bus) = router(Arc::new(SimulatedLink), RouteTable::standard());
        let task = Task::for_stage("middleware", Stage::Soc, "");

        assert_eq!(
            router.route(Stage::Soc, &task).await,
            RouteOutcome::Completed { spawned: 0 }
        );
        assert_eq!(registry.pending(), Vec::<Stage>::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_target_changes_nothing() {
        let (router, registry, bus) = router(Arc::new(SimulatedLink), RouteTable::standard());
        let mut rx = bus.subscribe();
        let task = Task::new("vip", "gateway", "");

        assert_eq!(router.route(Stage::Soc, &task).await, RouteOutcome::Dropped);
        assert!(!registry.any_completed());
        assert_eq!(registry.pending(), Vec::<Stage>::new());

        let ev = rx.recv().await.expect("dropped event");
        assert_eq!(ev.kind, EventKind::TaskDropped);
        assert_eq!(ev.stage, Some(Stage::Soc));
        assert_eq!(ev.target.as_deref(), Some("gateway"));
    }

    #[tokio::test]
    async fn test_link_failure_leaves_result_unset() {
        let routes = RouteTable::empty().with_route(Stage::Sail, IdPattern::Any, [Stage::Vip]);
        let (router, registry, _bus) = router(Arc::new(Refuse(Stage::Sail)), routes);
        let task = Task::for_stage("sail", Stage::Sail, "");

        assert_eq!(router.route(Stage::Sail, &task).await, RouteOutcome::Failed);
        assert!(!registry.queue(Stage::Sail).is_completed());
        assert!(registry.queue(Stage::Vip).is_empty());
    }

    #[tokio::test]
    async fn test_task_in_foreign_queue_is_routed_by_target() {
        let (router, registry, _bus) = router(Arc::new(Refuse(Stage::Switch)), RouteTable::standard());
        let task = Task::for_stage("cfg", Stage::Vip, "");

        assert_eq!(
            router.route(Stage::Soc, &task).await,
            RouteOutcome::Completed { spawned: 0 }
        );
        assert!(registry.queue(Stage::Vip).is_completed());
        assert!(!registry.queue(Stage::Soc).is_completed());
    }
}
