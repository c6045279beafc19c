//! # sagavisor
//!
//! **Sagavisor** is a small cooperative effect scheduler for event-driven
//! orchestration.
//!
//! Application code publishes plain [`Event`]s; **watchers** turn matching
//! events into **tasks**; each task runs a [`Routine`], a step-function that
//! yields [`Effect`]s (call an async operation, emit an event, spawn a task,
//! wait for an event) which the scheduler performs and resumes it with.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   state store / host                         transport layer
//!        │  publish(Event)                          ▲  Call::call(args)
//!        ▼                                          │
//! ┌──────────────────────────────────────────────────┴────────────────┐
//! │  Scheduler (single scheduling thread)                             │
//! │  - EventBus   (synchronous, ordered, unbuffered)                  │
//! │  - watchers   (Take / TakeEvery / TakeLatest)                     │
//! │  - Registry   (live tasks + bounded history)                      │
//! │  - in-flight  (FuturesUnordered of Invoke calls)                  │
//! └──────┬───────────────────────────────────────────┬────────────────┘
//!        │ advance(task)                             │ TaskEvent
//!        ▼                                           ▼
//!   Routine::resume ─► Effect                  SubscriberSet
//!     Invoke | Emit | Spawn | AwaitOne         (per-subscriber queues)
//! ```
//!
//! ### Task lifecycle
//! ```text
//! start ─► Running ─┬─ Invoke / AwaitOne ─► Suspended ─► (result | event) ─► Running
//!                   ├─ Done              ─► Completed
//!                   ├─ uncaught error    ─► Failed      (nothing published)
//!                   └─ superseded        ─► Cancelled   (late results discarded)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                      |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------|
//! | **Scheduling**    | Publish events, register watchers, drive in-flight calls.    | [`Scheduler`], [`SchedulerHandle`]      |
//! | **Routines**      | Explicit state machines yielding a closed set of effects.    | [`Routine`], [`Effect`], [`Sequence`]   |
//! | **Operations**    | Async `Invoke` targets with cancellation tokens.             | [`Call`], [`CallFn`]                    |
//! | **Policies**      | How watchers turn events into tasks.                         | [`WatchPolicy`]                         |
//! | **Subscriber API**| Hook into task lifecycle events (logging, metrics).          | [`Subscribe`], [`TaskEvent`]            |
//! | **Errors**        | Typed errors for transport, tasks and submission.            | [`TransportError`], [`TaskError`]       |
//! | **Users**         | List / create / delete orchestration over a users backend.   | [`users::UsersApi`], [`users::register`]|
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use serde_json::{Value, json};
//! use tokio_util::sync::CancellationToken;
//! use sagavisor::{
//!     BoxRoutine, CallFn, CallRef, Effect, Event, RoutineFn, Scheduler, SchedulerConfig,
//!     Sequence, TaskStatus, TransportError, WatchPolicy,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut sched = Scheduler::new(SchedulerConfig::default());
//!
//!     let lookup: CallRef = CallFn::arc("lookup", |args: Value, _ctx: CancellationToken| async move {
//!         Ok::<_, TransportError>(json!({ "found": args }))
//!     });
//!
//!     let resolve = RoutineFn::arc("resolve", move |args: Value| -> BoxRoutine {
//!         Box::new(Sequence::new("resolve", vec![Effect::invoke(lookup.clone(), args)]))
//!     });
//!     let watcher = sched.register_watcher("resolve_requested", WatchPolicy::TakeLatest, resolve);
//!
//!     sched.publish(Event::new("resolve_requested").with_payload(json!("a")));
//!     let task = sched.watcher_task(watcher).unwrap();
//!
//!     sched.run_until_idle().await;
//!     let info = sched.task(task).unwrap();
//!     assert_eq!(info.status, TaskStatus::Completed);
//!     assert_eq!(info.result, Some(json!({ "found": "a" })));
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

pub mod users;

// ---- Public re-exports ----

pub use core::{Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerHandle};
pub use error::{SubmitError, TaskError, TransportError};
pub use events::{Callback, Event, EventBus, EventKind, Matcher, Route, SubscriptionId};
pub use policies::{WatchPolicy, WatcherId};
pub use subscribers::{Subscribe, SubscriberSet, TaskEvent, TaskEventKind};
pub use tasks::{
    BoxCallFuture, BoxRoutine, Call, CallFn, CallRef, Effect, MakeRoutine, Resume, Routine,
    RoutineFn, RoutineRef, Sequence, Step, TaskId, TaskInfo, TaskStatus,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
