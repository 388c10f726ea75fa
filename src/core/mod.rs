//! Runtime core: stage queues, workers and the pipeline lifecycle.
//!
//! The public API from this module is [`Pipeline`] (built with
//! [`PipelineBuilder`]) and the [`StageStatus`] snapshot row.
//!
//! Internal modules:
//! - [`queue`]: one stage's FIFO plus its result flag;
//! - [`registry`]: the fixed set of stage queues;
//! - [`withdraw`]: the reversible withdraw mode;
//! - [`router`]: forwards one task and fans it out downstream;
//! - [`actor`]: the worker loop draining one stage queue;
//! - [`barrier`]: bounded polling until every queue is empty;
//! - [`shutdown`]: termination signal handling;
//! - [`builder`] / [`pipeline`]: wiring and the engine handle.

mod actor;
mod barrier;
mod builder;
mod pipeline;
mod queue;
mod registry;
mod router;
mod shutdown;
mod withdraw;

pub use builder::PipelineBuilder;
pub use pipeline::Pipeline;
pub use registry::StageStatus;
