//! Runtime core: scheduling and task lifecycle.
//!
//! The only public API from this module is [`Scheduler`] (with its builder,
//! config and submission handle), which owns the bus, the tasks and the
//! watchers.
//!
//! Internal modules:
//! - [`scheduler`]: publish/dispatch, watcher policies, cancellation, driving loops;
//! - [`interpreter`]: resumes routines and performs the effects they yield;
//! - [`registry`]: live task table and bounded history of finished tasks;
//! - [`watcher`]: per-watcher policy state.

mod builder;
mod config;
mod handle;
mod interpreter;
mod registry;
mod scheduler;
mod watcher;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use handle::SchedulerHandle;
pub use scheduler::Scheduler;
