//! # Lifecycle subscribers for the sagavisor runtime.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for observing task lifecycle events emitted by the scheduler.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Scheduler ── emit(TaskEvent) ──► SubscriberSet ──► per-subscriber queue
//!                                                          │
//!                                                          ├──► Subscribe::on_event(&TaskEvent)
//!                                                          │         │
//!                                                          │    ┌────┴────┬─────────┐
//!                                                          │    ▼         ▼         ▼
//!                                                          │  LogWriter  Metrics  Custom
//! ```
//!
//! Lifecycle events are diagnostics only; they are not application events and
//! never reach the [`EventBus`](crate::EventBus).

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;
mod task_event;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
pub use task_event::{TaskEvent, TaskEventKind};
