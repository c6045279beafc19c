//! # Routines, effects and task identity.
//!
//! This module provides the building blocks the scheduler executes:
//! - [`Routine`] - step-function coroutine yielding [`Effect`]s
//! - [`Resume`] / [`Step`] - the values exchanged with a routine at each step
//! - [`Effect`] - closed set of effect descriptors (invoke, emit, spawn, await)
//! - [`Call`] / [`CallFn`] / [`CallRef`] - external async operations for `Invoke`
//! - [`MakeRoutine`] / [`RoutineFn`] / [`RoutineRef`] - routine factories
//! - [`Sequence`] - a routine made of a fixed list of effects
//! - [`TaskId`] / [`TaskStatus`] / [`TaskInfo`] - task identity and status

mod call;
mod effect;
mod routine;
mod sequence;
mod task;

pub use call::{BoxCallFuture, Call, CallFn, CallRef};
pub use effect::Effect;
pub use routine::{BoxRoutine, MakeRoutine, Resume, Routine, RoutineFn, RoutineRef, Step};
pub use sequence::Sequence;
pub use task::{TaskId, TaskInfo, TaskStatus};
