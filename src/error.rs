//! Error types used by the stagevisor runtime, links and command layer.
//!
//! - [`RuntimeError`] failures of the engine itself (drain/shutdown deadlines).
//! - [`LinkError`] a forwarding step to a stage failed.
//! - [`ParseStageError`] a target name does not match any [`Stage`].
//! - [`CommandError`] a command line could not be understood.
//!
//! Engine and link errors provide `as_label` for logs/metrics, like the events do.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::Stage;

/// # Errors produced by the pipeline runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Queued work was still present when the drain deadline passed.
    #[error("queues not drained within {timeout:?}; pending: {pending:?}")]
    QuiescenceTimeout {
        /// The drain budget that was exceeded.
        timeout: Duration,
        /// Stages whose queues were non-empty when the deadline passed.
        pending: Vec<Stage>,
    },

    /// Stage workers did not exit within the shutdown grace period.
    #[error("stage workers still running after {grace:?}; aborted")]
    ShutdownTimeout {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use stagevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimeout { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::QuiescenceTimeout { .. } => "runtime_quiescence_timeout",
            RuntimeError::ShutdownTimeout { .. } => "runtime_shutdown_timeout",
        }
    }
}

/// # Errors produced while forwarding a packet to a stage.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The stage could not be reached at all.
    #[error("stage {stage} unreachable: {error}")]
    Unreachable {
        /// Stage that was addressed.
        stage: Stage,
        /// Underlying error message.
        error: String,
    },

    /// The stage answered but refused the packet.
    #[error("stage {stage} rejected packet: {error}")]
    Rejected {
        /// Stage that was addressed.
        stage: Stage,
        /// Underlying error message.
        error: String,
    },
}

impl LinkError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LinkError::Unreachable { .. } => "link_unreachable",
            LinkError::Rejected { .. } => "link_rejected",
        }
    }
}

/// A target name that does not match any known stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stage {0:?}")]
pub struct ParseStageError(pub String);

/// # Errors produced while reading commands.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Non-blank input that is not a known command.
    #[error("unknown command: {0}")]
    Unknown(String),
}
