//! # stagevisor
//!
//! **Stagevisor** forwards update packets through a fixed chain of processing
//! stages (`soc`, `sail`, `vip`, `switch`), one async worker per stage.
//!
//! It adds two controls on top of plain forwarding: a reversible **withdraw**
//! mode that cancels queued work, and a bounded **quiescence barrier** that
//! waits for every stage queue to drain.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        Orchestrator (start / transfer / query)
//!                         │ submit(task)
//!                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pipeline (engine handle)                                         │
//! │  - StageRegistry (one FIFO + result flag per stage)               │
//! │  - WithdrawSignal (watch<bool>)                                   │
//! │  - Bus (broadcast events) ──► SubscriberSet (per-sub queues)      │
//! └──────┬──────────────┬──────────────┬──────────────┬───────────────┘
//!        ▼              ▼              ▼              ▼
//!   ┌─────────┐    ┌─────────┐    ┌─────────┐    ┌──────────┐
//!   │worker   │    │worker   │    │worker   │    │worker    │
//!   │  soc    │    │  sail   │    │  vip    │    │  switch  │
//!   └────┬────┘    └────┬────┘    └────┬────┘    └────┬─────┘
//!        └──────────────┴──── Router ──┴──────────────┘
//!                              │  link.transfer / link.mount
//!                              ▼
//!                   RouteTable fan-out: soc ─► sail | vip | switch
//! ```
//!
//! ### Worker loop
//! ```text
//! loop {
//!   ├─► cancelled?      ─► exit
//!   ├─► withdraw on?    ─► drain queue (TaskCancelled), idle, continue
//!   ├─► queue empty?    ─► park until push / mode change / cancel
//!   └─► route(head)     ─► remove head
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Engine**        | Stage queues, workers, withdraw mode, barrier, shutdown. | [`Pipeline`], [`PipelineBuilder`]           |
//! | **Routing**       | Declarative fan-out and pluggable transport.             | [`RouteTable`], [`Link`], [`SimulatedLink`] |
//! | **Subscriber API**| Hook into pipeline events (logging, metrics, ...).       | [`Subscribe`], [`LogWriter`]                |
//! | **Commands**      | Operator commands over any async line reader.            | [`Orchestrator`], [`CommandLoop`]           |
//! | **Errors**        | Typed errors for engine, links and commands.             | [`RuntimeError`], [`LinkError`]             |
//! | **Configuration** | Centralized runtime settings.                            | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use stagevisor::{Command, Config, LogWriter, Orchestrator, Pipeline, Reply, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let pipeline = Pipeline::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let orch = Orchestrator::new(pipeline.clone());
//!     assert_eq!(orch.execute(Command::Start).await, Reply::Prepared);
//!
//!     pipeline.shutdown().await.expect("workers stop");
//! }
//! ```

mod commands;
mod config;
mod core;
mod error;
mod events;
mod routing;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use commands::{Command, CommandLoop, Orchestrator, Reply, demo_batch, spawn_line_reader};
pub use config::Config;
pub use self::core::{Pipeline, PipelineBuilder, StageStatus};
pub use error::{CommandError, LinkError, ParseStageError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use routing::{IdPattern, Link, LinkRef, Route, RouteTable, SimulatedLink};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{MOUNT_LATENCY, Stage, Task};
