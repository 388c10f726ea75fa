//! # Stage registry: owns one [`StageQueue`] per stage.
//!
//! Constructed once per pipeline and shared (`Arc`) with the router, the
//! workers and the barrier, so independent pipelines never share state.
//!
//! ## Rules
//! - Indexed by [`Stage::index`]; iteration follows [`Stage::ALL`].
//! - Each stage's result flag is only touched through its own queue lock.

use std::sync::Arc;

use crate::core::queue::StageQueue;
use crate::tasks::Stage;

/// Queue and result state of one stage at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStatus {
    /// The stage.
    pub stage: Stage,
    /// Tasks queued, including the one currently being processed.
    pub queued: usize,
    /// Whether the stage forwarded a packet successfully this cycle.
    pub completed: bool,
}

/// All stage queues of one pipeline.
#[derive(Debug)]
pub(crate) struct StageRegistry {
    queues: [Arc<StageQueue>; Stage::COUNT],
}

impl StageRegistry {
    pub(crate) fn new() -> Self {
        Self {
            queues: Stage::ALL.map(|stage| Arc::new(StageQueue::new(stage))),
        }
    }

    pub(crate) fn queue(&self, stage: Stage) -> &Arc<StageQueue> {
        &self.queues[stage.index()]
    }

    /// Queues in enumeration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<StageQueue>> {
        self.queues.iter()
    }

    /// Clears every stage's result flag, one stage lock at a time.
    pub(crate) fn reset_results(&self) {
        for q in self.iter() {
            q.set_completed(false);
        }
    }

    /// Stages whose queues are currently non-empty.
    pub(crate) fn pending(&self) -> Vec<Stage> {
        self.iter()
            .filter(|q| !q.is_empty())
            .map(|q| q.stage())
            .collect()
    }

    pub(crate) fn any_completed(&self) -> bool {
        self.iter().any(|q| q.is_completed())
    }

    pub(crate) fn snapshot(&self) -> Vec<StageStatus> {
        self.iter()
            .map(|q| StageStatus {
                stage: q.stage(),
                queued: q.len(),
                completed: q.is_completed(),
            })
            .collect()
    }
}
