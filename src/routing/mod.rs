//! Routing: where packets go and how they get there.
//!
//! ## Contents
//! - [`RouteTable`], [`Route`], [`IdPattern`] declarative fan-out topology
//! - [`Link`], [`SimulatedLink`] transport used to forward and mount packets
//!
//! ## Quick wiring
//! ```text
//! Router::route(stage, task)
//!   ├─► link.transfer(target, task)
//!   ├─► for each stage in routes.downstream(target, task.id):
//!   │       link.mount(target, task) ─► push task.retarget(stage)
//!   └─► mark target completed
//! ```

mod link;
mod table;

pub use link::{Link, LinkRef, SimulatedLink};
pub use table::{IdPattern, Route, RouteTable};
