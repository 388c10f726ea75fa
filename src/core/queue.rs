//! # Stage queue: FIFO of pending tasks plus the stage's result flag.
//!
//! Both live behind **one** lock per stage. The lock is only held for the
//! duration of a push/peek/pop; it is never held across an `.await`.
//!
//! ## Head-of-line visibility
//! ```text
//! worker:  peek() ──► Router::route(head) ──► remove_head()
//!                       (head still queued: is_empty() == false)
//! ```
//! The barrier therefore treats a task as outstanding until its side effects,
//! including any fan-out it triggers, are complete.
//!
//! ## Rules
//! - Only the owning worker removes tasks (`remove_head`, `drain`).
//! - Seed and the router push; every push wakes the worker.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, futures::Notified};

use crate::tasks::{Stage, Task};

/// State guarded by the stage lock.
#[derive(Debug, Default)]
struct Slot {
    pending: VecDeque<Task>,
    completed: bool,
}

/// Queue and result flag of a single stage.
#[derive(Debug)]
pub(crate) struct StageQueue {
    stage: Stage,
    slot: Mutex<Slot>,
    wake: Notify,
}

impl StageQueue {
    pub(crate) fn new(stage: Stage) -> Self {
        Self {
            stage,
            slot: Mutex::new(Slot::default()),
            wake: Notify::new(),
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    /// A panicking lock holder cannot leave the slot half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `task` to the tail and wakes the worker. Returns the new depth.
    pub(crate) fn push(&self, task: Task) -> usize {
        let depth = {
            let mut slot = self.lock();
            slot.pending.push_back(task);
            slot.pending.len()
        };
        self.wake.notify_one();
        depth
    }

    /// Clone of the head, left in place.
    pub(crate) fn peek(&self) -> Option<Task> {
        self.lock().pending.front().cloned()
    }

    /// Removes the head after it has been processed.
    pub(crate) fn remove_head(&self) -> Option<Task> {
        self.lock().pending.pop_front()
    }

    /// Removes every queued task, in FIFO order.
    pub(crate) fn drain(&self) -> Vec<Task> {
        self.lock().pending.drain(..).collect()
    }

    /// Non-blocking emptiness check.
    pub(crate) fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub(crate) fn set_completed(&self, completed: bool) {
        self.lock().completed = completed;
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.lock().completed
    }

    /// Resolves after the next push (or immediately if a push was not yet observed).
    ///
    /// Callers must re-check the queue after waking.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.wake.notified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(id: &str) -> Task {
        Task::for_stage(id, Stage::Sail, "")
    }

    #[test]
    fn test_peek_leaves_head_until_removed() {
        let q = StageQueue::new(Stage::Sail);
        q.push(task("a"));
        q.push(task("b"));

        assert_eq!(q.peek(), Some(task("a")));
        assert_eq!(q.len(), 2);
        assert!(!q.is_empty());

        assert_eq!(q.remove_head(), Some(task("a")));
        assert_eq!(q.peek(), Some(task("b")));
    }

    #[test]
    fn test_drain_returns_fifo_order() {
        let q = StageQueue::new(Stage::Sail);
        for id in ["a", "b", "c"] {
            q.push(task(id));
        }
        let drained: Vec<String> = q.drain().iter().map(|t| t.id().to_string()).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let q = StageQueue::new(Stage::Sail);
        assert_eq!(q.push(task("a")), 1);
        assert_eq!(q.push(task("a")), 2);
    }

    #[test]
    fn test_completion_flag() {
        let q = StageQueue::new(Stage::Vip);
        assert!(!q.is_completed());
        q.set_completed(true);
        assert!(q.is_completed());
        q.set_completed(false);
        assert!(!q.is_completed());
    }

    #[tokio::test]
    async fn test_push_wakes_waiter() {
        let q = std::sync::Arc::new(StageQueue::new(Stage::Soc));
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move {
                q.notified().await;
                q.peek()
            })
        };
        tokio::task::yield_now().await;
        q.push(task("x"));

        let seen = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("waiter joined");
        assert_eq!(seen, Some(task("x")));
    }
}
