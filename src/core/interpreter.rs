//! # Effect interpreter: advances one task by one step at a time.
//!
//! ## Step loop
//! ```text
//! advance(task, input)
//! loop {
//!   ├─► task still live?            no ─► return (cancelled / finished)
//!   ├─► routine.resume(input)
//!   │     ├─ Done(v)   ─► finish(Completed)
//!   │     ├─ Fail(e)   ─► finish(Failed)        (nothing published)
//!   │     └─ Yield(effect)
//!   └─► execute(effect)
//!         ├─ Invoke    ─► push call future, Suspended        ─► return
//!         ├─ AwaitOne  ─► one-shot subscription, Suspended   ─► return
//!         ├─ Emit      ─► publish (re-entrant) ─► still live? ─► input = Unit
//!         └─ Spawn     ─► start child          ─► still live? ─► input = Spawned(child)
//! }
//! ```
//!
//! ## Rules
//! - `Emit` and `Spawn` never suspend; whatever they trigger runs to its first
//!   suspension point before the emitting task continues.
//! - A task is re-checked for liveness after every re-entrant effect and before
//!   every resumption, so a cancelled task is never resumed.
//! - The routine is taken out of the table only for the duration of `resume`,
//!   which never calls back into the scheduler.

use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use super::scheduler::Scheduler;
use crate::error::TransportError;
use crate::events::{Matcher, Sink};
use crate::subscribers::TaskEventKind;
use crate::tasks::{Effect, Resume, Step, TaskId, TaskStatus};

impl Scheduler {
    /// Resumes `id` with `input` and keeps executing effects until the task
    /// suspends or reaches a terminal status.
    pub(super) fn advance(&mut self, id: TaskId, mut input: Resume) {
        loop {
            let Some(entry) = self.tasks.get_mut(id) else {
                return;
            };
            if entry.token.is_cancelled() {
                return;
            }
            let Some(mut routine) = entry.routine.take() else {
                return;
            };
            entry.status = TaskStatus::Running;
            let step = routine.resume(input);
            entry.routine = Some(routine);

            let effect = match step {
                Step::Yield(effect) => effect,
                Step::Done(value) => {
                    self.finish(id, TaskStatus::Completed, Some(value), None);
                    return;
                }
                Step::Fail(err) => {
                    self.finish(id, TaskStatus::Failed, None, Some(err));
                    return;
                }
            };

            input = match self.execute(id, effect) {
                Some(next) => next,
                None => return,
            };
        }
    }

    /// Performs one effect for `id`.
    ///
    /// Returns the value to resume with immediately, or `None` when the task
    /// is now suspended or no longer live.
    fn execute(&mut self, id: TaskId, effect: Effect) -> Option<Resume> {
        match effect {
            Effect::Invoke { call, args } => {
                let ctx = self.tasks.get(id)?.token.child_token();
                debug!(task = %id, call = call.name(), "invoke");
                let fut = call.call(args, ctx);
                self.in_flight.push(fut.map(move |res| (id, res)).boxed());
                self.suspend(id, "invoke");
                None
            }
            Effect::AwaitOne { kind } => {
                debug!(task = %id, %kind, "await one");
                let sub = self
                    .bus
                    .attach(Matcher::Kind(kind), Sink::Awaiter(id), true);
                if let Some(entry) = self.tasks.get_mut(id) {
                    entry.wait = Some(sub);
                }
                self.suspend(id, "await_one");
                None
            }
            Effect::Emit(event) => {
                self.publish(event);
                self.tasks.is_live(id).then_some(Resume::Unit)
            }
            Effect::Spawn { routine, args } => {
                let child = self.start_task(&routine, args, Some(id), None);
                self.tasks.is_live(id).then_some(Resume::Spawned(child))
            }
        }
    }

    fn suspend(&mut self, id: TaskId, effect: &'static str) {
        if let Some(entry) = self.tasks.get_mut(id) {
            entry.status = TaskStatus::Suspended;
        }
        self.notify(id, TaskEventKind::TaskSuspended, |ev| ev.with_effect(effect));
    }

    /// Handles the completion of an `Invoke` issued by `id`.
    ///
    /// Success resumes the routine with the value; failure is raised at the
    /// yield point. Results for tasks that are no longer live are dropped.
    pub(super) fn complete_invoke(&mut self, id: TaskId, res: Result<Value, TransportError>) {
        let live = self
            .tasks
            .get(id)
            .is_some_and(|e| !e.token.is_cancelled());
        if !live {
            debug!(task = %id, ok = res.is_ok(), "discarding result of cancelled task");
            self.notify(id, TaskEventKind::ResultDiscarded, |ev| ev);
            return;
        }

        let input = match res {
            Ok(value) => Resume::Value(value),
            Err(err) => {
                debug!(task = %id, error = %err, "invoke failed");
                Resume::Throw(err)
            }
        };
        self.advance(id, input);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};
    use tokio::sync::oneshot;
    use tokio_util::sync::CancellationToken;

    use crate::error::{TaskError, TransportError};
    use crate::events::{Event, Matcher};
    use crate::policies::WatchPolicy;
    use crate::tasks::{
        BoxRoutine, CallFn, CallRef, Effect, Resume, Routine, RoutineFn, RoutineRef, Sequence,
        Step, TaskStatus,
    };
    use crate::{Scheduler, SchedulerConfig};

    type Log = Arc<Mutex<Vec<String>>>;

    fn record_all(sched: &mut Scheduler) -> Log {
        let log: Log = Arc::default();
        let sink = log.clone();
        sched.subscribe(Matcher::Any, move |ev| {
            sink.lock().unwrap().push(ev.kind().to_string());
        });
        log
    }

    fn ok_call(name: &'static str, value: Value) -> CallRef {
        CallFn::arc(name, move |_args: Value, _ctx: CancellationToken| {
            let value = value.clone();
            async move { Ok::<_, TransportError>(value) }
        })
    }

    fn failing_call(name: &'static str) -> CallRef {
        CallFn::arc(name, |_args: Value, _ctx: CancellationToken| async move {
            Err::<Value, _>(TransportError::new("refused"))
        })
    }

    fn seq(name: &'static str, effects: Vec<Effect>) -> RoutineRef {
        RoutineFn::arc(name, move |_args: Value| -> BoxRoutine {
            Box::new(Sequence::new(name, effects.clone()))
        })
    }

    /// Catches an `Invoke` failure and emits `caught`.
    struct Guarded {
        call: CallRef,
        state: u8,
    }

    impl Routine for Guarded {
        fn name(&self) -> &str {
            "guarded"
        }

        fn resume(&mut self, input: Resume) -> Step {
            self.state += 1;
            match (self.state, input) {
                (1, _) => Step::Yield(Effect::invoke(self.call.clone(), Value::Null)),
                (2, Resume::Throw(_)) => Step::Yield(Effect::emit(Event::new("caught"))),
                (2, _) => Step::Yield(Effect::emit(Event::new("fine"))),
                _ => Step::Done(Value::Null),
            }
        }
    }

    #[tokio::test]
    async fn invoke_success_resumes_with_value() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let id = sched.spawn(
            seq("fetch", vec![Effect::invoke(ok_call("get", json!(42)), Value::Null)]),
            Value::Null,
        );

        assert_eq!(sched.task(id).unwrap().status, TaskStatus::Suspended);
        assert_eq!(sched.in_flight(), 1);

        assert_eq!(sched.run_until_idle().await, 1);
        let info = sched.task(id).unwrap();
        assert_eq!(info.status, TaskStatus::Completed);
        assert_eq!(info.result, Some(json!(42)));
    }

    #[tokio::test]
    async fn uncaught_invoke_failure_is_silent() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        let id = sched.spawn(
            seq("fragile", vec![Effect::invoke(failing_call("get"), Value::Null)]),
            Value::Null,
        );

        sched.run_until_idle().await;

        let info = sched.task(id).unwrap();
        assert_eq!(info.status, TaskStatus::Failed);
        assert!(matches!(info.error, Some(TaskError::Transport(_))));
        assert!(log.lock().unwrap().is_empty(), "nothing may be published");
    }

    /// Invokes once and expects a number back, with no error boundary.
    struct Count {
        call: CallRef,
        started: bool,
    }

    impl Routine for Count {
        fn name(&self) -> &str {
            "count"
        }

        fn resume(&mut self, input: Resume) -> Step {
            if !self.started {
                self.started = true;
                return Step::Yield(Effect::invoke(self.call.clone(), Value::Null));
            }
            match input.decode::<u64>("count") {
                Ok(n) => Step::Done(json!(n)),
                Err(err) => Step::Fail(err),
            }
        }
    }

    #[tokio::test]
    async fn undecodable_result_fails_task_with_decode_error() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        let call = ok_call("get", json!("seven"));
        let count = RoutineFn::arc("count", move |_args: Value| -> BoxRoutine {
            Box::new(Count {
                call: call.clone(),
                started: false,
            })
        });
        let id = sched.spawn(count, Value::Null);

        sched.run_until_idle().await;

        let info = sched.task(id).unwrap();
        assert_eq!(info.status, TaskStatus::Failed);
        match info.error {
            Some(TaskError::Decode { routine, .. }) => assert_eq!(routine, "count"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invoke_failure_reaches_local_handler() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        let call = failing_call("get");
        let guarded = RoutineFn::arc("guarded", move |_args: Value| -> BoxRoutine {
            Box::new(Guarded {
                call: call.clone(),
                state: 0,
            })
        });
        let id = sched.spawn(guarded, Value::Null);

        sched.run_until_idle().await;

        assert_eq!(sched.task(id).unwrap().status, TaskStatus::Completed);
        assert_eq!(*log.lock().unwrap(), vec!["caught"]);
    }

    #[test]
    fn await_one_resumes_with_payload() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let id = sched.spawn(seq("waiter", vec![Effect::await_one("go")]), Value::Null);
        assert_eq!(sched.task(id).unwrap().status, TaskStatus::Suspended);

        sched.publish(Event::new("other"));
        assert_eq!(sched.task(id).unwrap().status, TaskStatus::Suspended);

        sched.publish(Event::new("go").with_payload(json!({ "n": 1 })));
        let info = sched.task(id).unwrap();
        assert_eq!(info.status, TaskStatus::Completed);
        assert_eq!(info.result, Some(json!({ "n": 1 })));
    }

    #[test]
    fn emit_runs_triggered_watchers_before_continuing() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        sched.register_watcher(
            "ping",
            WatchPolicy::TakeEvery,
            seq("pong", vec![Effect::emit(Event::new("pong"))]),
        );

        sched.spawn(
            seq(
                "pinger",
                vec![Effect::emit(Event::new("ping")), Effect::emit(Event::new("after"))],
            ),
            Value::Null,
        );

        assert_eq!(*log.lock().unwrap(), vec!["ping", "pong", "after"]);
    }

    #[test]
    fn spawn_does_not_wait_for_child() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        let child = seq(
            "child",
            vec![Effect::await_one("release"), Effect::emit(Event::new("child_done"))],
        );
        let parent = sched.spawn(
            seq(
                "parent",
                vec![Effect::spawn(child, Value::Null), Effect::emit(Event::new("parent_done"))],
            ),
            Value::Null,
        );

        let info = sched.task(parent).unwrap();
        assert_eq!(info.status, TaskStatus::Completed);
        let child_id = sched.live_tasks()[0];
        assert_eq!(sched.task(child_id).unwrap().parent, Some(parent));
        assert_eq!(*log.lock().unwrap(), vec!["parent_done"]);

        sched.publish(Event::new("release"));
        assert_eq!(*log.lock().unwrap(), vec!["parent_done", "release", "child_done"]);
        assert!(sched.live_tasks().is_empty());
    }

    #[tokio::test]
    async fn cancelled_task_discards_late_result() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let log = record_all(&mut sched);
        let (tx, rx) = oneshot::channel::<Value>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let gated: CallRef = CallFn::arc("gated", move |_args: Value, _ctx: CancellationToken| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(|_| TransportError::new("gate dropped")),
                    None => Err(TransportError::new("gate used")),
                }
            }
        });
        let watcher = sched.register_watcher(
            "go",
            WatchPolicy::TakeLatest,
            seq(
                "slow",
                vec![Effect::invoke(gated, Value::Null), Effect::emit(Event::new("slow_done"))],
            ),
        );

        sched.publish(Event::new("go"));
        let first = sched.watcher_task(watcher).unwrap();
        sched.publish(Event::new("go"));
        let second = sched.watcher_task(watcher).unwrap();
        assert_ne!(first, second);
        assert_eq!(sched.task(first).unwrap().status, TaskStatus::Cancelled);

        tx.send(json!(1)).unwrap();
        sched.run_until_idle().await;

        // The second task hit a used gate and failed silently; the first was discarded.
        assert_eq!(sched.task(first).unwrap().status, TaskStatus::Cancelled);
        assert_eq!(sched.task(second).unwrap().status, TaskStatus::Failed);
        assert_eq!(*log.lock().unwrap(), vec!["go", "go"]);
    }
}
