//! # Routines: step-function coroutines.
//!
//! A [`Routine`] is an explicit state machine. The interpreter drives it by
//! calling [`Routine::resume`] with the outcome of the previous effect; the
//! routine answers with the next [`Step`]. No native generators are involved:
//! whatever a routine needs across a suspension point lives in its own fields.
//!
//! ```text
//! resume(Start) ─► Yield(effect₁)
//!                    └─ interpreter runs effect₁
//! resume(r₁)    ─► Yield(effect₂)
//!                    └─ ...
//! resume(rₙ)    ─► Done(value) | Fail(error)
//! ```
//!
//! ## Errors at the yield point
//! A failed `Invoke` resumes the routine with [`Resume::Throw`]. A routine
//! with a local error boundary turns it into further effects (typically an
//! `Emit`); one without answers [`Step::Fail`], which ends the task as
//! `Failed` and publishes nothing.
//!
//! ## Factories
//! Watchers and `Spawn` need to build a fresh routine per task. That is what
//! [`MakeRoutine`] does; [`RoutineFn`] wraps a closure, [`RoutineRef`] is the
//! shared handle.

use std::borrow::Cow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{TaskError, TransportError};
use crate::tasks::effect::Effect;
use crate::tasks::task::TaskId;

/// Boxed routine instance.
pub type BoxRoutine = Box<dyn Routine>;

/// Shared handle to a routine factory (`Arc<dyn MakeRoutine>`).
pub type RoutineRef = Arc<dyn MakeRoutine>;

/// Value a routine is resumed with.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// First step of a fresh task.
    Start,
    /// The previous effect produced nothing (`Emit`).
    Unit,
    /// The previous effect produced a value (`Invoke` success, `AwaitOne` payload).
    Value(Value),
    /// The previous `Spawn` started this task.
    Spawned(TaskId),
    /// The previous `Invoke` failed; raised at the yield point.
    Throw(TransportError),
}

impl Resume {
    /// Collapses the resumption into a result, mapping `Throw` to `Err`.
    ///
    /// `Start` and `Unit` become `Value::Null`; `Spawned` becomes the raw id.
    pub fn into_result(self) -> Result<Value, TransportError> {
        match self {
            Resume::Start | Resume::Unit => Ok(Value::Null),
            Resume::Value(v) => Ok(v),
            Resume::Spawned(id) => Ok(Value::from(id.get())),
            Resume::Throw(e) => Err(e),
        }
    }

    /// Decodes the resumption value into `T` on behalf of `routine`.
    ///
    /// `Throw` becomes [`TaskError::Transport`]; a value of the wrong shape
    /// becomes [`TaskError::Decode`].
    pub fn decode<T: DeserializeOwned>(self, routine: &str) -> Result<T, TaskError> {
        let value = self.into_result()?;
        serde_json::from_value(value).map_err(|e| TaskError::decode(routine, e))
    }
}

/// What a routine does next.
#[derive(Debug)]
pub enum Step {
    /// Ask the scheduler to perform an effect, then resume.
    Yield(Effect),
    /// The routine finished with a value.
    Done(Value),
    /// The routine finished with an unhandled error.
    Fail(TaskError),
}

/// # Effect-yielding state machine.
///
/// A given instance runs at most once end to end; build a new one through a
/// [`MakeRoutine`] to run the same logic again.
pub trait Routine: Send + 'static {
    /// Stable, human-readable name (for logs and [`TaskInfo`](crate::TaskInfo)).
    fn name(&self) -> &str;

    /// Advances the routine by one step.
    fn resume(&mut self, input: Resume) -> Step;
}

/// # Factory that builds a fresh routine per task.
pub trait MakeRoutine: Send + Sync + 'static {
    /// Name shared by every routine this factory builds.
    fn name(&self) -> &str;

    /// Builds a new routine from `args` (a watcher passes the event payload).
    fn make(&self, args: Value) -> BoxRoutine;
}

/// Function-backed routine factory.
///
/// ## Example
/// ```rust
/// use serde_json::{Value, json};
/// use sagavisor::{BoxRoutine, Effect, Event, RoutineFn, RoutineRef, Sequence};
///
/// let notify: RoutineRef = RoutineFn::arc("notify", |args: Value| -> BoxRoutine {
///     Box::new(Sequence::new(
///         "notify",
///         vec![Effect::emit(Event::new("notified").with_payload(args))],
///     ))
/// });
///
/// assert_eq!(notify.name(), "notify");
/// let _routine = notify.make(json!({ "to": "ops" }));
/// ```
pub struct RoutineFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> RoutineFn<F> {
    /// Creates a new function-backed factory.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> MakeRoutine for RoutineFn<F>
where
    F: Fn(Value) -> BoxRoutine + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn make(&self, args: Value) -> BoxRoutine {
        (self.f)(args)
    }
}
