//! # Effect descriptors.
//!
//! An [`Effect`] is a plain data value a routine yields to ask the scheduler
//! for something. The set is closed; the interpreter matches it exhaustively.
//!
//! | Effect     | Suspends? | Resumes with                         |
//! |------------|-----------|--------------------------------------|
//! | `Invoke`   | yes       | `Resume::Value` or `Resume::Throw`   |
//! | `Emit`     | no        | `Resume::Unit`                       |
//! | `Spawn`    | no        | `Resume::Spawned(TaskId)`            |
//! | `AwaitOne` | yes       | `Resume::Value(payload)`             |

use std::fmt;

use serde_json::Value;

use crate::events::{Event, EventKind};
use crate::tasks::call::CallRef;
use crate::tasks::routine::RoutineRef;

/// A requested action, interpreted by the scheduler.
#[derive(Clone)]
pub enum Effect {
    /// Call an external async operation.
    Invoke {
        /// Operation to call.
        call: CallRef,
        /// Arguments passed to it.
        args: Value,
    },
    /// Publish an event on the bus (synchronous, re-entrant).
    Emit(Event),
    /// Start a concurrent task without waiting for it.
    Spawn {
        /// Routine factory for the new task.
        routine: RoutineRef,
        /// Arguments handed to the factory.
        args: Value,
    },
    /// Park until one event of this kind is published.
    AwaitOne {
        /// Kind to wait for.
        kind: EventKind,
    },
}

impl Effect {
    /// Shorthand for [`Effect::Invoke`].
    pub fn invoke(call: CallRef, args: Value) -> Self {
        Effect::Invoke { call, args }
    }

    /// Shorthand for [`Effect::Emit`].
    pub fn emit(event: Event) -> Self {
        Effect::Emit(event)
    }

    /// Shorthand for [`Effect::Spawn`].
    pub fn spawn(routine: RoutineRef, args: Value) -> Self {
        Effect::Spawn { routine, args }
    }

    /// Shorthand for [`Effect::AwaitOne`].
    pub fn await_one(kind: impl Into<EventKind>) -> Self {
        Effect::AwaitOne { kind: kind.into() }
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Effect::Invoke { .. } => "invoke",
            Effect::Emit(_) => "emit",
            Effect::Spawn { .. } => "spawn",
            Effect::AwaitOne { .. } => "await_one",
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Invoke { call, args } => f
                .debug_struct("Invoke")
                .field("call", &call.name())
                .field("args", args)
                .finish(),
            Effect::Emit(ev) => f.debug_tuple("Emit").field(ev).finish(),
            Effect::Spawn { routine, args } => f
                .debug_struct("Spawn")
                .field("routine", &routine.name())
                .field("args", args)
                .finish(),
            Effect::AwaitOne { kind } => f.debug_struct("AwaitOne").field("kind", kind).finish(),
        }
    }
}
