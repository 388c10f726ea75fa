//! # Orchestrator: the three operator commands on top of a [`Pipeline`].
//!
//! ```text
//! start    ─► reset_results ─► enter_withdraw ─► drain(T) ─► exit_withdraw
//!                                                  ├─ Ok  ─► Prepared
//!                                                  └─ Err ─► PrepareFailed
//! transfer ─► submit(batch) onto soc ─► Transferred { count }
//! query    ─► drain(T) ├─ Ok  ─► any_completed ? UpgradeSucceeded : UpgradeFailed
//!                      └─ Err ─► QueryTimedOut
//! ```
//!
//! `T` is [`Config::barrier_timeout`](crate::Config::barrier_timeout).
//! Withdraw is always switched off again, whatever the drain outcome.

use std::{fmt, sync::Arc};

use crate::{
    commands::Command,
    core::Pipeline,
    error::RuntimeError,
    tasks::{Stage, Task},
};

/// The packet batch seeded by `transfer`: five packets, all addressed to `soc`.
pub fn demo_batch() -> Vec<Task> {
    ["description", "vip", "sail", "rootfs", "middleware"]
        .into_iter()
        .enumerate()
        .map(|(i, id)| Task::for_stage(id, Stage::Soc, format!("/tmp/update_temp_file_{}", i + 1)))
        .collect()
}

/// Outcome of one command, rendered as the line shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `start`: in-flight work stopped, ready to upgrade.
    Prepared,
    /// `start`: queues did not drain in time.
    PrepareFailed(RuntimeError),
    /// `transfer`: `count` packets seeded.
    Transferred { count: usize },
    /// `query`: drained and at least one stage completed.
    UpgradeSucceeded,
    /// `query`: drained but no stage completed.
    UpgradeFailed,
    /// `query`: queues did not drain in time.
    QueryTimedOut(RuntimeError),
    /// Input was not a command.
    Unknown(String),
}

impl Reply {
    /// Whether the command achieved what it was asked to.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Reply::Prepared | Reply::Transferred { .. } | Reply::UpgradeSucceeded
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Prepared => write!(f, "existing upgrade work stopped, ready to upgrade"),
            Reply::PrepareFailed(e) => {
                write!(f, "timed out stopping existing upgrade work, not ready: {e}")
            }
            Reply::Transferred { count } => write!(f, "received {count} packets from update app"),
            Reply::UpgradeSucceeded => write!(f, "pipeline finished, upgrade succeeded"),
            Reply::UpgradeFailed => write!(f, "pipeline finished, upgrade failed"),
            Reply::QueryTimedOut(e) => {
                write!(f, "timed out waiting for pipeline, upgrade failed: {e}")
            }
            Reply::Unknown(line) => write!(f, "unknown command: {line}"),
        }
    }
}

/// Executes operator commands against one pipeline.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    batch: Vec<Task>,
}

impl Orchestrator {
    /// Orchestrator seeding [`demo_batch`] on `transfer`.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            batch: demo_batch(),
        }
    }

    /// Replaces the batch seeded on `transfer`.
    pub fn with_batch(mut self, batch: Vec<Task>) -> Self {
        self.batch = batch;
        self
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Runs one command to completion.
    pub async fn execute(&self, cmd: Command) -> Reply {
        match cmd {
            Command::Start => self.start().await,
            Command::Transfer => self.transfer(),
            Command::Query => self.query().await,
        }
    }

    async fn start(&self) -> Reply {
        self.pipeline.reset_results();
        self.pipeline.enter_withdraw();
        let drained = self
            .pipeline
            .drain(self.pipeline.config().barrier_timeout)
            .await;
        self.pipeline.exit_withdraw();

        match drained {
            Ok(()) => Reply::Prepared,
            Err(e) => Reply::PrepareFailed(e),
        }
    }

    fn transfer(&self) -> Reply {
        for task in &self.batch {
            self.pipeline.submit(task.clone());
        }
        Reply::Transferred {
            count: self.batch.len(),
        }
    }

    async fn query(&self) -> Reply {
        match self
            .pipeline
            .drain(self.pipeline.config().barrier_timeout)
            .await
        {
            Ok(()) if self.pipeline.any_completed() => Reply::UpgradeSucceeded,
            Ok(()) => Reply::UpgradeFailed,
            Err(e) => Reply::QueryTimedOut(e),
        }
    }
}
