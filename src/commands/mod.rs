//! Operator commands: parsing, execution and the line-oriented loop.
//!
//! - [`Command`] one parsed input line (`start`, `transfer`, `query`);
//! - [`Orchestrator`] runs a command against a [`Pipeline`](crate::Pipeline) and returns a [`Reply`];
//! - [`CommandLoop`] reads lines from any async reader and writes replies.

mod command;
mod command_loop;
mod orchestrator;

pub use command::Command;
pub use command_loop::{CommandLoop, spawn_line_reader};
pub use orchestrator::{Orchestrator, Reply, demo_batch};
