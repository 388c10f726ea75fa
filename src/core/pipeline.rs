//! # Pipeline: owns the stages, their workers and the withdraw signal.
//!
//! The [`Pipeline`] is the engine handle. It owns the event bus, the stage
//! registry and the runtime token that every stage worker runs under. A
//! [`SubscriberSet`] is driven by its event listener task.
//!
//! ## Key responsibilities
//! - accept seeded tasks and push them onto stage queues
//! - switch withdraw mode on and off
//! - run the quiescence barrier and report stage results
//! - handle OS signals and shut workers down within [`Config::grace`]
//!
//! ## High-level architecture
//! ```text
//! submit(task) ──► [soc queue] ──► worker soc ──► Router ──► [sail|vip|switch queue]
//!                                                   │              │
//!                                                   ▼              ▼
//!                                             result[soc]    worker ... ──► result[...]
//!
//! enter_withdraw() ──► watch ──► every worker drains its queue (TaskCancelled)
//!
//! wait_all_quiescent(T) ──► poll soc, sail, vip, switch until empty or T elapsed
//!
//! Event flow:
//!   workers / router / pipeline ── publish ──► Bus ──► event_listener ──► SubscriberSet
//!   shutdown ─► workers joined ─► WorkersStopped ─► listener drained ─► subscribers flushed
//! ```
//!
//! ## Example
//! ```rust
//! use stagevisor::{Config, Pipeline, Stage, Task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let pipeline = Pipeline::builder(Config::default()).build();
//!
//!     pipeline.submit(Task::for_stage("description", Stage::Soc, "/tmp/update_temp_file_1"));
//!     assert_eq!(pipeline.queued(Stage::Soc), 1);
//!
//!     pipeline.shutdown().await.expect("workers stop");
//! }
//! ```

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, broadcast},
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    config::Config,
    core::{
        barrier,
        builder::PipelineBuilder,
        registry::{StageRegistry, StageStatus},
        shutdown,
        withdraw::WithdrawSignal,
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    subscribers::SubscriberSet,
    tasks::{Stage, Task},
};

/// Engine handle: stage queues, workers, withdraw signal and event delivery.
///
/// Dropping the pipeline cancels its workers without waiting for them.
pub struct Pipeline {
    cfg: Config,
    bus: Bus,
    listener: Mutex<Option<JoinHandle<()>>>,
    registry: Arc<StageRegistry>,
    withdraw: WithdrawSignal,
    workers: Mutex<JoinSet<()>>,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
}

impl Pipeline {
    /// Starts building a pipeline with the given configuration.
    pub fn builder(cfg: Config) -> PipelineBuilder {
        PipelineBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: SubscriberSet,
        registry: Arc<StageRegistry>,
        withdraw: WithdrawSignal,
        workers: JoinSet<()>,
        runtime_token: CancellationToken,
    ) -> Self {
        let listener_token = CancellationToken::new();
        let listener = Self::spawn_event_listener(&bus, subs, listener_token.clone());
        Self {
            cfg,
            bus,
            listener: Mutex::new(Some(listener)),
            registry,
            withdraw,
            workers: Mutex::new(workers),
            runtime_token,
            listener_token,
        }
    }

    /// Forwards bus events to the subscriber set until `stop` is cancelled.
    ///
    /// Events already buffered when `stop` fires are still delivered, then the
    /// subscriber queues are closed and flushed.
    fn spawn_event_listener(
        bus: &Bus,
        set: SubscriberSet,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            set.emit(&Event::events_lagged(skipped));
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Seeds `task` onto the entry stage ([`Stage::ENTRY`]).
    pub fn submit(&self, task: Task) {
        self.push(Stage::ENTRY, task);
    }

    /// Pushes `task` onto the queue of `stage` and wakes its worker.
    ///
    /// The task is routed by its own `target`, whichever queue it sits in.
    pub fn push(&self, stage: Stage, task: Task) {
        self.bus.publish(
            Event::new(EventKind::TaskSubmitted)
                .with_stage(stage)
                .with_task(&task),
        );
        self.registry.queue(stage).push(task);
    }

    /// Switches withdraw mode on. Returns `true` if it was off.
    pub fn enter_withdraw(&self) -> bool {
        let changed = self.withdraw.enter();
        if changed {
            self.bus.publish(Event::new(EventKind::WithdrawEntered));
        }
        changed
    }

    /// Switches withdraw mode off. Returns `true` if it was on.
    pub fn exit_withdraw(&self) -> bool {
        let changed = self.withdraw.exit();
        if changed {
            self.bus.publish(Event::new(EventKind::WithdrawExited));
        }
        changed
    }

    /// True while withdraw mode is on.
    pub fn is_withdrawing(&self) -> bool {
        self.withdraw.is_active()
    }

    /// Clears every stage's result flag.
    pub fn reset_results(&self) {
        self.registry.reset_results();
        self.bus.publish(Event::new(EventKind::ResultsReset));
    }

    /// Whether `stage` forwarded a packet successfully since the last reset.
    pub fn is_completed(&self, stage: Stage) -> bool {
        self.registry.queue(stage).is_completed()
    }

    /// Result flag of every stage, in enumeration order.
    pub fn results(&self) -> [(Stage, bool); Stage::COUNT] {
        Stage::ALL.map(|stage| (stage, self.is_completed(stage)))
    }

    /// True if at least one stage completed since the last reset.
    pub fn any_completed(&self) -> bool {
        self.registry.any_completed()
    }

    /// Number of tasks queued on `stage`, including one being processed.
    pub fn queued(&self, stage: Stage) -> usize {
        self.registry.queue(stage).len()
    }

    /// Queue depth and result of every stage, in enumeration order.
    pub fn snapshot(&self) -> Vec<StageStatus> {
        self.registry.snapshot()
    }

    /// Waits until every stage queue is empty or `timeout` elapses.
    ///
    /// Stages are checked in [`Stage::ALL`] order against one shared budget.
    /// Returns `false` no later than `timeout` plus one poll interval.
    pub async fn wait_all_quiescent(&self, timeout: Duration) -> bool {
        self.drain(timeout).await.is_ok()
    }

    /// Like [`wait_all_quiescent`](Self::wait_all_quiescent) but reports which
    /// stages still held work when the budget ran out.
    pub async fn drain(&self, timeout: Duration) -> Result<(), RuntimeError> {
        let poll = self.cfg.poll_interval_clamped();
        match barrier::wait_all_quiescent(&self.registry, timeout, poll).await {
            Ok(elapsed) => {
                self.bus.publish(
                    Event::new(EventKind::QuiescenceReached)
                        .with_elapsed(elapsed)
                        .with_timeout(timeout),
                );
                Ok(())
            }
            Err(stage) => {
                self.bus.publish(
                    Event::new(EventKind::QuiescenceTimeout)
                        .with_stage(stage)
                        .with_timeout(timeout),
                );
                Err(RuntimeError::QuiescenceTimeout {
                    timeout,
                    pending: self.registry.pending(),
                })
            }
        }
    }

    /// Receiver for raw runtime events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs `work` until it finishes or a termination signal arrives, then shuts down.
    pub async fn run_until<F>(&self, work: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {}
            _ = work => {}
        }
        self.shutdown().await
    }

    /// Cancels every stage worker and waits up to [`Config::grace`] for them to exit.
    ///
    /// Workers finish the task they are routing before exiting; queued tasks stay
    /// queued. Workers still running after the grace period are aborted.
    /// Subscribers have seen every event, including the final one, when this returns.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let grace = self.cfg.grace;
        let stopped = {
            let mut workers = self.workers.lock().await;
            let done = async { while workers.join_next().await.is_some() {} };
            match tokio::time::timeout(grace, done).await {
                Ok(()) => {
                    self.bus.publish(Event::new(EventKind::WorkersStopped));
                    Ok(())
                }
                Err(_) => {
                    workers.abort_all();
                    Err(RuntimeError::ShutdownTimeout { grace })
                }
            }
        };

        self.stop_listener(grace).await;
        stopped
    }

    /// Lets the event listener deliver what is buffered, then waits for subscribers.
    async fn stop_listener(&self, grace: Duration) {
        self.listener_token.cancel();
        let Some(mut handle) = self.listener.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            warn!(?grace, "subscribers did not finish within grace; aborting");
            handle.abort();
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.listener_token.cancel();
    }
}
