//! # Work items and the stages they flow through.
//!
//! - [`Task`] immutable unit of work (`id`, `target`, `path`)
//! - [`Stage`] fixed set of named processing steps

mod stage;
mod task;

pub use stage::{MOUNT_LATENCY, Stage};
pub use task::Task;
