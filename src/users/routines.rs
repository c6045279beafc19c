//! # Users routines.
//!
//! Each routine has one error boundary around its whole body: any transport
//! failure or malformed value ends in exactly one `OperationFailed` with the
//! routine's fixed message.
//!
//! ```text
//! ListUsers   Invoke(fetch_list{limit}) ─┬─ ok  ─► Emit(ListSucceeded{items})
//!                                        └─ err ─► Emit(OperationFailed(get))
//!
//! Mutation    Invoke(write) ─┬─ ok  ─► ListUsers (its outcome is the routine's)
//!                            └─ err ─► Emit(OperationFailed(create | delete))
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{TaskError, TransportError};
use crate::tasks::{BoxRoutine, CallFn, CallRef, Effect, Resume, Routine, RoutineFn, RoutineRef, Step};
use crate::users::api::{LIST_LIMIT, UsersApi};
use crate::users::events::{self, CREATE_FAILED, DELETE_FAILED, GET_FAILED};
use crate::users::model::{DeleteRequest, NewUser, UserId, UserPage};

/// The backend operations as `Invoke` targets.
#[derive(Clone)]
pub struct UsersCalls {
    pub fetch_list: CallRef,
    pub create_one: CallRef,
    pub delete_one: CallRef,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, TransportError> {
    serde_json::to_value(value).map_err(|e| TransportError::new(format!("encode: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::new(format!("bad arguments: {e}")))
}

impl UsersCalls {
    pub fn new(api: Arc<dyn UsersApi>) -> Self {
        let a = api.clone();
        let fetch_list = CallFn::arc("users.fetch_list", move |args: Value, _ctx: CancellationToken| {
            let api = a.clone();
            async move {
                let limit = args
                    .get("limit")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(LIST_LIMIT);
                let page = api.fetch_list(limit).await?;
                to_json(&page)
            }
        });

        let a = api.clone();
        let create_one = CallFn::arc("users.create_one", move |args: Value, _ctx: CancellationToken| {
            let api = a.clone();
            async move {
                let user: NewUser = from_json(args)?;
                let created = api.create_one(user).await?;
                to_json(&created)
            }
        });

        let delete_one = CallFn::arc("users.delete_one", move |args: Value, _ctx: CancellationToken| {
            let api = api.clone();
            async move {
                let id: UserId = from_json(args)?;
                api.delete_one(id).await?;
                Ok(Value::Null)
            }
        });

        Self {
            fetch_list,
            create_one,
            delete_one,
        }
    }
}

// ---------------------------
// List
// ---------------------------

enum ListState {
    Start,
    Fetching,
    Reported,
}

/// Fetches the list and reports it.
pub struct ListUsers {
    fetch: CallRef,
    state: ListState,
}

impl ListUsers {
    pub const NAME: &'static str = "users.list";

    pub fn new(calls: &UsersCalls) -> Self {
        Self::with_fetch(calls.fetch_list.clone())
    }

    fn with_fetch(fetch: CallRef) -> Self {
        Self {
            fetch,
            state: ListState::Start,
        }
    }
}

impl Routine for ListUsers {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn resume(&mut self, input: Resume) -> Step {
        match self.state {
            ListState::Start => {
                self.state = ListState::Fetching;
                Step::Yield(Effect::invoke(self.fetch.clone(), json!({ "limit": LIST_LIMIT })))
            }
            ListState::Fetching => {
                self.state = ListState::Reported;
                match input.decode::<UserPage>(Self::NAME) {
                    Ok(page) => Step::Yield(Effect::emit(events::list_succeeded(&page))),
                    Err(err) => {
                        debug!(routine = Self::NAME, error = err.as_label(), reason = %err, "list failed");
                        Step::Yield(Effect::emit(events::operation_failed(GET_FAILED)))
                    }
                }
            }
            ListState::Reported => Step::Done(Value::Null),
        }
    }
}

// ---------------------------
// Create / delete
// ---------------------------

enum MutationState {
    /// Arguments were rejected before any call.
    Invalid,
    Start(Value),
    Writing,
    Listing(ListUsers),
    Failing,
    Done,
}

/// A write followed by a fresh list fetch.
///
/// Once the write succeeded, the embedded [`ListUsers`] reports the outcome
/// (including its own failure message).
pub struct Mutation {
    name: &'static str,
    write: CallRef,
    failure: &'static str,
    fetch: CallRef,
    state: MutationState,
}

impl Mutation {
    /// Creates a user from a `{ firstName, lastName }` payload.
    pub fn create(calls: &UsersCalls, payload: Value) -> Self {
        let args = serde_json::from_value::<NewUser>(payload)
            .and_then(serde_json::to_value)
            .map_err(|e| TaskError::decode("users.create", e));
        Self::new("users.create", calls.create_one.clone(), CREATE_FAILED, calls, args)
    }

    /// Deletes a user from an `{ id }` payload.
    pub fn delete(calls: &UsersCalls, payload: Value) -> Self {
        let args = serde_json::from_value::<DeleteRequest>(payload)
            .map(|req| json!(req.id))
            .map_err(|e| TaskError::decode("users.delete", e));
        Self::new("users.delete", calls.delete_one.clone(), DELETE_FAILED, calls, args)
    }

    fn new(
        name: &'static str,
        write: CallRef,
        failure: &'static str,
        calls: &UsersCalls,
        args: Result<Value, TaskError>,
    ) -> Self {
        let state = match args {
            Ok(args) => MutationState::Start(args),
            Err(err) => {
                debug!(routine = name, error = err.as_label(), reason = %err, "rejected payload");
                MutationState::Invalid
            }
        };
        Self {
            name,
            write,
            failure,
            fetch: calls.fetch_list.clone(),
            state,
        }
    }

    fn fail(&mut self) -> Step {
        self.state = MutationState::Failing;
        Step::Yield(Effect::emit(events::operation_failed(self.failure)))
    }

    fn delegate(&mut self, mut list: ListUsers, input: Resume) -> Step {
        match list.resume(input) {
            Step::Yield(effect) => {
                self.state = MutationState::Listing(list);
                Step::Yield(effect)
            }
            Step::Done(value) => {
                self.state = MutationState::Done;
                Step::Done(value)
            }
            Step::Fail(err) => {
                debug!(routine = self.name, error = %err, "list step failed");
                self.fail()
            }
        }
    }
}

impl Routine for Mutation {
    fn name(&self) -> &str {
        self.name
    }

    fn resume(&mut self, input: Resume) -> Step {
        match std::mem::replace(&mut self.state, MutationState::Done) {
            MutationState::Invalid => self.fail(),
            MutationState::Start(args) => {
                self.state = MutationState::Writing;
                Step::Yield(Effect::invoke(self.write.clone(), args))
            }
            MutationState::Writing => match input.into_result() {
                Ok(_) => self.delegate(ListUsers::with_fetch(self.fetch.clone()), Resume::Start),
                Err(err) => {
                    debug!(routine = self.name, error = %err, "write failed");
                    self.fail()
                }
            },
            MutationState::Listing(list) => self.delegate(list, input),
            MutationState::Failing | MutationState::Done => Step::Done(Value::Null),
        }
    }
}

// ---------------------------
// Factories
// ---------------------------

pub fn list_routine(calls: UsersCalls) -> RoutineRef {
    RoutineFn::arc(ListUsers::NAME, move |_payload: Value| -> BoxRoutine {
        Box::new(ListUsers::new(&calls))
    })
}

pub fn create_routine(calls: UsersCalls) -> RoutineRef {
    RoutineFn::arc("users.create", move |payload: Value| -> BoxRoutine {
        Box::new(Mutation::create(&calls, payload))
    })
}

pub fn delete_routine(calls: UsersCalls) -> RoutineRef {
    RoutineFn::arc("users.delete", move |payload: Value| -> BoxRoutine {
        Box::new(Mutation::delete(&calls, payload))
    })
}
