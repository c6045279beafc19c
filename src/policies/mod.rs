//! Watcher policies.
//!
//! This module groups the knob that controls **how** a watcher turns matching
//! events into tasks.
//!
//! ## Contents
//! - [`WatchPolicy`] take (serialize) / take-every (fan-out) / take-latest (supersede)
//! - [`WatcherId`] handle returned by `Scheduler::register_watcher`
//!
//! ## Quick wiring
//! ```text
//! register_watcher(kind, policy, routine)
//!      └─► core::Scheduler uses:
//!           - policy to decide start / cancel-then-start / ignore-while-busy
//!           - routine.make(payload) to build each task
//! ```

mod watch;

pub use watch::{WatchPolicy, WatcherId};
