//! # Scheduler: owns tasks, watchers and the event bus.
//!
//! The [`Scheduler`] is the only component that creates or cancels tasks. It
//! owns the [`EventBus`], the task table and the watcher table, and it is the
//! context object every operation goes through (no global state).
//!
//! ## Key responsibilities
//! - deliver published events synchronously, in subscription order
//! - apply watcher policies (`Take`, `TakeEvery`, `TakeLatest`)
//! - cancel superseded tasks (and everything they spawned)
//! - drive in-flight `Invoke` calls and resume (or discard) their tasks
//!
//! ## High-level architecture
//! ```text
//! publish(Event) ─► EventBus snapshot (registration order)
//!                     ├─► callback            ─► f(&Event)
//!                     ├─► watcher(policy)     ─► [cancel previous] ─► start_task ─► advance
//!                     └─► awaiter(task)       ─► advance(task, payload)
//!
//! advance(task) ─► routine.resume ─► Effect
//!                     ├─ Invoke   ─► in_flight.push(call future)     (suspend)
//!                     ├─ AwaitOne ─► bus.subscribe_once(kind)        (suspend)
//!                     ├─ Emit     ─► publish(Event)                  (re-entrant, continue)
//!                     └─ Spawn    ─► start_task(child)               (continue)
//!
//! run_until_idle / run ─► in_flight.next() ─► task live? advance : discard
//! ```
//!
//! ## Concurrency model
//! One scheduling thread: exactly one routine step executes at a time and
//! tasks interleave only at `Invoke` and `AwaitOne`. The scheduler is `Send`
//! so it can be moved onto a dedicated task, but it is driven through
//! `&mut self` and never shares its tables.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use serde_json::{Value, json};
//! use sagavisor::{
//!     BoxRoutine, Effect, Event, Matcher, RoutineFn, Scheduler, SchedulerConfig, Sequence,
//!     WatchPolicy,
//! };
//!
//! let mut sched = Scheduler::new(SchedulerConfig::default());
//!
//! let greet = RoutineFn::arc("greet", |args: Value| -> BoxRoutine {
//!     Box::new(Sequence::new("greet", vec![Effect::emit(Event::new("greeted").with_payload(args))]))
//! });
//! sched.register_watcher("greet_requested", WatchPolicy::TakeEvery, greet);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! sched.subscribe(Matcher::kind("greeted"), move |ev| sink.lock().unwrap().push(ev.payload_or_null()));
//!
//! sched.publish(Event::new("greet_requested").with_payload(json!("hi")));
//! assert_eq!(*seen.lock().unwrap(), vec![json!("hi")]);
//! ```

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    builder::SchedulerBuilder, config::SchedulerConfig, handle::SchedulerHandle,
    registry::Registry, watcher::Watcher,
};
use crate::error::{TaskError, TransportError};
use crate::events::{Event, EventBus, EventKind, Matcher, Route, Sink, SubscriptionId};
use crate::policies::{WatchPolicy, WatcherId};
use crate::subscribers::{SubscriberSet, TaskEvent, TaskEventKind};
use crate::tasks::{Resume, RoutineRef, TaskId, TaskInfo, TaskStatus};

/// Future of one in-flight `Invoke`, tagged with its task.
pub(super) type InFlight = BoxFuture<'static, (TaskId, Result<Value, TransportError>)>;

/// Cooperative effect scheduler.
pub struct Scheduler {
    pub(super) cfg: SchedulerConfig,
    pub(super) bus: EventBus,
    pub(super) tasks: Registry,
    pub(super) watchers: Vec<Watcher>,
    pub(super) in_flight: FuturesUnordered<InFlight>,
    pub(super) subs: SubscriberSet,
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
}

impl Scheduler {
    /// Creates a scheduler without subscribers.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self::builder(cfg).build()
    }

    /// Creates a builder.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: SchedulerConfig, subs: SubscriberSet) -> Self {
        let (tx, rx) = mpsc::channel(cfg.queue_capacity_clamped());
        let tasks = Registry::new(cfg.finished_limit());
        Self {
            cfg,
            bus: EventBus::new(),
            tasks,
            watchers: Vec::new(),
            in_flight: FuturesUnordered::new(),
            subs,
            tx,
            rx,
        }
    }

    /// Configuration the scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.cfg
    }

    /// Returns a handle for submitting events to [`run`](Self::run).
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle::new(self.tx.clone())
    }

    // ---------------------------
    // Bus surface
    // ---------------------------

    /// Registers an external subscriber for every future matching event.
    pub fn subscribe<F>(&mut self, matcher: impl Into<Matcher>, f: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.bus.subscribe(matcher, f)
    }

    /// Registers an external subscriber for the next matching event only.
    pub fn subscribe_once<F>(&mut self, matcher: impl Into<Matcher>, f: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.bus.subscribe_once(matcher, f)
    }

    /// Removes an external subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Publishes an event.
    ///
    /// Every subscriber registered at this moment is reached, in registration
    /// order, before this returns. Watchers start their tasks and parked tasks
    /// resume here, each running until its next suspension point; any events
    /// they emit are delivered (recursively) before the next subscriber of
    /// this event is reached.
    pub fn publish(&mut self, event: Event) {
        debug!(kind = %event.kind(), seq = event.seq(), "publish");
        for sub in self.bus.snapshot(&event) {
            match self.bus.route(sub, &event) {
                Some(Route::Watcher(w)) => self.on_watcher_event(w, &event),
                Some(Route::Awaiter(task)) => self.on_awaited(task, sub, &event),
                Some(Route::Delivered) | None => {}
            }
        }
    }

    // ---------------------------
    // Watchers and tasks
    // ---------------------------

    /// Installs a standing watcher for `kind`.
    ///
    /// Each matching event builds a task with `routine.make(payload)`
    /// (`Value::Null` when the event has no payload), subject to `policy`.
    pub fn register_watcher(
        &mut self,
        kind: impl Into<EventKind>,
        policy: WatchPolicy,
        routine: RoutineRef,
    ) -> WatcherId {
        let kind = kind.into();
        let id = WatcherId::new(self.watchers.len());
        let sub = self.bus.attach(
            Matcher::Kind(kind.clone()),
            Sink::Watcher(id),
            Watcher::one_shot(policy),
        );
        info!(watcher = %id, %kind, %policy, routine = routine.name(), "watcher registered");
        self.watchers.push(Watcher::new(id, kind, policy, routine, sub));
        id
    }

    /// Starts a root task (no watcher, no parent) and runs it to its first
    /// suspension point.
    pub fn spawn(&mut self, routine: RoutineRef, args: Value) -> TaskId {
        self.start_task(&routine, args, None, None)
    }

    /// Snapshot of a live task, or of a finished one still in the history.
    pub fn task(&self, id: TaskId) -> Option<TaskInfo> {
        self.tasks.info(id)
    }

    /// Ids of tasks that have not reached a terminal status.
    pub fn live_tasks(&self) -> Vec<TaskId> {
        self.tasks.live_ids()
    }

    /// Task a watcher is currently tracking (see [`WatchPolicy`]).
    pub fn watcher_task(&self, id: WatcherId) -> Option<TaskId> {
        self.watchers.get(id.index()).and_then(|w| w.active)
    }

    /// Number of `Invoke` calls not yet completed (including discarded ones).
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    // ---------------------------
    // Driving
    // ---------------------------

    /// Drives in-flight calls until none is left.
    ///
    /// Returns the number of completions processed. Tasks parked on
    /// `AwaitOne` stay `Suspended`.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut done = 0;
        while let Some((task, res)) = self.in_flight.next().await {
            self.complete_invoke(task, res);
            done += 1;
        }
        done
    }

    /// Long-running loop: publishes events submitted through
    /// [`SchedulerHandle`]s and completes in-flight calls until `token` fires.
    pub async fn run(&mut self, token: CancellationToken) {
        info!("scheduler loop started");
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some((task, res)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete_invoke(task, res);
                }
                Some(event) = self.rx.recv() => {
                    self.publish(event);
                }
            }
        }
        info!(live = self.tasks.live_ids().len(), in_flight = self.in_flight.len(), "scheduler loop stopped");
    }

    /// Closes subscriber queues and waits for their workers.
    pub async fn shutdown(self) {
        self.subs.shutdown().await;
    }

    // ---------------------------
    // Internals
    // ---------------------------

    /// Creates a task and runs it to its first suspension point.
    pub(super) fn start_task(
        &mut self,
        routine: &RoutineRef,
        args: Value,
        parent: Option<TaskId>,
        watcher: Option<WatcherId>,
    ) -> TaskId {
        let token = match parent.and_then(|p| self.tasks.get(p)) {
            Some(p) => p.token.child_token(),
            None => CancellationToken::new(),
        };
        let id = self.tasks.insert(routine.make(args), token, parent, watcher);
        if let Some(p) = parent.and_then(|p| self.tasks.get_mut(p)) {
            p.children.push(id);
        }
        if let Some(w) = watcher.and_then(|w| self.watchers.get_mut(w.index())) {
            w.active = Some(id);
        }

        debug!(task = %id, name = routine.name(), ?parent, "task started");
        self.notify(id, TaskEventKind::TaskStarted, |ev| ev.with_parent(parent));
        self.advance(id, Resume::Start);
        id
    }

    fn on_watcher_event(&mut self, id: WatcherId, event: &Event) {
        let Some(w) = self.watchers.get_mut(id.index()) else {
            return;
        };
        let policy = w.policy;
        let routine = w.routine.clone();
        let previous = w.active;
        if Watcher::one_shot(policy) {
            // The one-shot subscription was consumed by this delivery.
            w.subscription = None;
        }

        if policy == WatchPolicy::TakeLatest {
            if let Some(prev) = previous.filter(|t| self.tasks.is_live(*t)) {
                debug!(watcher = %id, task = %prev, "superseding task");
                self.cancel(prev);
            }
        }

        self.start_task(&routine, event.payload_or_null(), None, Some(id));
    }

    fn on_awaited(&mut self, task: TaskId, sub: SubscriptionId, event: &Event) {
        let Some(entry) = self.tasks.get_mut(task) else {
            return;
        };
        if entry.wait == Some(sub) {
            entry.wait = None;
        }
        self.advance(task, Resume::Value(event.payload_or_null()));
    }

    /// Cancels a task and every live task it spawned.
    ///
    /// Pending `AwaitOne` subscriptions are removed; in-flight calls are left
    /// to finish and their results are discarded on completion.
    pub(super) fn cancel(&mut self, id: TaskId) {
        let Some(entry) = self.tasks.get(id) else {
            return;
        };
        entry.token.cancel();
        let wait = entry.wait;
        let children = entry.children.clone();

        if let Some(sub) = wait {
            self.bus.unsubscribe(sub);
        }
        self.finish(id, TaskStatus::Cancelled, None, None);
        for child in children {
            self.cancel(child);
        }
    }

    /// Retires a task with its terminal status and releases its watcher.
    pub(super) fn finish(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<TaskError>,
    ) {
        let Some((entry, info)) = self.tasks.retire(id, status, result, error) else {
            return;
        };
        if let Some(parent) = entry.parent.and_then(|p| self.tasks.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }

        let kind = match status {
            TaskStatus::Cancelled => TaskEventKind::TaskCancelled,
            TaskStatus::Failed => TaskEventKind::TaskFailed,
            _ => TaskEventKind::TaskCompleted,
        };
        match &info.error {
            Some(err) => {
                debug!(task = %id, name = %info.name, error = err.as_label(), "task failed");
                let reason = err.as_message();
                self.subs
                    .emit(TaskEvent::new(kind, id, entry.name.clone()).with_reason(reason));
            }
            None => {
                debug!(task = %id, name = %info.name, %status, "task finished");
                self.subs.emit(TaskEvent::new(kind, id, entry.name.clone()));
            }
        }

        if let Some(w) = entry.watcher {
            self.release_watcher(w, id);
        }
    }

    fn release_watcher(&mut self, id: WatcherId, task: TaskId) {
        let Some(w) = self.watchers.get_mut(id.index()) else {
            return;
        };
        if w.active != Some(task) {
            return;
        }
        w.active = None;
        if Watcher::one_shot(w.policy) && w.subscription.is_none() {
            let sub = self
                .bus
                .attach(Matcher::Kind(w.kind.clone()), Sink::Watcher(w.id), true);
            w.subscription = Some(sub);
            debug!(watcher = %w.id, kind = %w.kind, "watcher re-armed");
        }
    }

    pub(super) fn notify(
        &self,
        id: TaskId,
        kind: TaskEventKind,
        decorate: impl FnOnce(TaskEvent) -> TaskEvent,
    ) {
        if self.subs.is_empty() {
            return;
        }
        let name = match self.tasks.get(id) {
            Some(e) => e.name.clone(),
            None => match self.tasks.info(id) {
                Some(info) => info.name,
                None => return,
            },
        };
        self.subs.emit(decorate(TaskEvent::new(kind, id, name)));
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("cfg", &self.cfg)
            .field("bus", &self.bus)
            .field("live", &self.tasks.live_ids())
            .field("watchers", &self.watchers.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
