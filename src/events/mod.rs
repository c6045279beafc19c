//! Application events: data model and synchronous bus.
//!
//! This module groups the event **data model** and the **bus** that carries
//! it between the state-store collaborator, watchers and parked tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] kind-tagged notification with optional JSON payload
//! - [`EventBus`] ordered, synchronous, unbuffered publish/subscribe
//! - [`Matcher`], [`SubscriptionId`], [`Route`] subscription plumbing
//!
//! ## Quick reference
//! - **Publishers**: the host (through `Scheduler::publish` / `SchedulerHandle`)
//!   and routines (through `Effect::Emit`).
//! - **Consumers**: external callbacks, watchers (`Scheduler::register_watcher`)
//!   and tasks parked on `Effect::AwaitOne`.

mod bus;
mod event;

pub(crate) use bus::Sink;
pub use bus::{Callback, EventBus, Matcher, Route, SubscriptionId};
pub use event::{Event, EventKind};
