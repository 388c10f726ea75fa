//! # Event subscribers for the stagevisor runtime.
//!
//! ## Architecture
//! ```text
//!   StageWorker / Router ── publish(Event) ──► Bus ──► event_listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                                  ┌───────┴───────┐
//!                                                  ▼               ▼
//!                                              LogWriter        Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use stagevisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct CancelCounter;
//!
//! #[async_trait]
//! impl Subscribe for CancelCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskCancelled {
//!             // increment counter
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
