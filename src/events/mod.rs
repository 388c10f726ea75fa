//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Pipeline`, `StageWorker`, `Router`, `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: the pipeline's event listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Pipeline::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
