//! # Task: the immutable unit of work.
//!
//! A [`Task`] names a logical packet (`id`), the stage that must process it
//! (`target`) and an opaque payload locator (`path`). Values never change after
//! construction; fan-out produces a *new* task through [`Task::retarget`].
//!
//! `target` is kept as a plain string so that a packet addressed to a stage the
//! pipeline does not know can still be queued and later dropped by the router.

use std::sync::Arc;

use crate::error::ParseStageError;
use crate::tasks::stage::Stage;

/// Unit of simulated forwarding work.
///
/// Cheap to clone (all fields are `Arc<str>`). Two tasks are equal when all
/// three fields are equal; duplicates may sit in a queue at the same time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    id: Arc<str>,
    target: Arc<str>,
    path: Arc<str>,
}

impl Task {
    /// Creates a task addressed to an arbitrary target name.
    pub fn new(
        id: impl Into<Arc<str>>,
        target: impl Into<Arc<str>>,
        path: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            path: path.into(),
        }
    }

    /// Creates a task addressed to a known stage.
    pub fn for_stage(id: impl Into<Arc<str>>, stage: Stage, path: impl Into<Arc<str>>) -> Self {
        Self::new(id, stage.as_str(), path)
    }

    /// Logical packet identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the stage that must process this task.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Payload locator (opaque, never inspected by routing).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolves `target` to a known stage.
    pub fn stage(&self) -> Result<Stage, ParseStageError> {
        self.target.parse()
    }

    /// Returns a new task with the same `id` and `path`, addressed to `stage`.
    pub fn retarget(&self, stage: Stage) -> Task {
        Task {
            id: Arc::clone(&self.id),
            target: Arc::from(stage.as_str()),
            path: Arc::clone(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retarget_keeps_id_and_leaves_original() {
        let original = Task::for_stage("vip", Stage::Soc, "/tmp/update_temp_file_2");
        let spawned = original.retarget(Stage::Vip);

        assert_eq!(spawned.id(), "vip");
        assert_eq!(spawned.target(), "vip");
        assert_eq!(spawned.path(), "/tmp/update_temp_file_2");
        assert_eq!(original.target(), "soc");
        assert_ne!(original, spawned);
    }

    #[test]
    fn test_unknown_target_does_not_resolve() {
        let task = Task::new("x", "gateway", "");
        assert!(task.stage().is_err());
        assert_eq!(task.target(), "gateway");
    }
}
