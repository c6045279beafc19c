//! # In-process publish/subscribe channel for application events.
//!
//! [`EventBus`] is the state-store's action stream. It is owned by the
//! [`Scheduler`](crate::Scheduler) and mutated only from the scheduling thread.
//!
//! ## Architecture
//! ```text
//! publish(&Event)
//!     │ snapshot of matching subscriptions (registration order)
//!     ├──► [sub 1] Callback  ──► f(&Event)           (external subscriber)
//!     ├──► [sub 2] Watcher   ──► Route::Watcher(w)   (scheduler starts a task)
//!     └──► [sub 3] Awaiter   ──► Route::Awaiter(t)   (scheduler resumes a task)
//! ```
//!
//! ## Rules
//! - **Synchronous**: every matching subscriber is reached before `publish` returns.
//! - **Registration order**: subscribers are visited in the order they subscribed.
//! - **No buffering**: a subscriber registered after an event was published never sees it.
//! - **Snapshot**: subscribers added while an event is being delivered do not see that event;
//!   subscribers removed mid-delivery are skipped.
//! - **One-shot** subscriptions are removed right before their single delivery.

use std::fmt;
use std::sync::Arc;

use super::event::{Event, EventKind};
use crate::policies::WatcherId;
use crate::tasks::TaskId;

/// Opaque handle identifying one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Predicate deciding which events a subscription receives.
#[derive(Clone)]
pub enum Matcher {
    /// Every event.
    Any,
    /// Events whose kind equals this one.
    Kind(EventKind),
    /// Arbitrary predicate.
    Predicate(Arc<dyn Fn(&Event) -> bool + Send + Sync>),
}

impl Matcher {
    /// Matches events of the given kind.
    pub fn kind(kind: impl Into<EventKind>) -> Self {
        Matcher::Kind(kind.into())
    }

    /// Matches events accepted by `f`.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    /// True when `ev` should be delivered.
    pub fn matches(&self, ev: &Event) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Kind(kind) => ev.kind() == kind,
            Matcher::Predicate(f) => f(ev),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Kind(kind) => write!(f, "Kind({kind})"),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(kind: &str) -> Self {
        Matcher::kind(kind)
    }
}

impl From<EventKind> for Matcher {
    fn from(kind: EventKind) -> Self {
        Matcher::Kind(kind)
    }
}

/// Callback invoked synchronously for each delivered event.
pub type Callback = Box<dyn FnMut(&Event) + Send>;

/// Receiving end of a subscription.
pub(crate) enum Sink {
    Callback(Callback),
    Watcher(WatcherId),
    Awaiter(TaskId),
}

/// Outcome of delivering an event to one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// A callback was invoked in place.
    Delivered,
    /// A watcher matched; the scheduler must apply its policy.
    Watcher(WatcherId),
    /// A parked task matched; the scheduler must resume it.
    Awaiter(TaskId),
}

struct Subscription {
    id: SubscriptionId,
    matcher: Matcher,
    sink: Sink,
    once: bool,
}

/// Synchronous, ordered, unbuffered event bus.
#[derive(Default)]
pub struct EventBus {
    subs: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for every future event accepted by `matcher`.
    pub fn subscribe<F>(&mut self, matcher: impl Into<Matcher>, f: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.attach(matcher.into(), Sink::Callback(Box::new(f)), false)
    }

    /// Registers `f` for the next single event accepted by `matcher`.
    pub fn subscribe_once<F>(&mut self, matcher: impl Into<Matcher>, f: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.attach(matcher.into(), Sink::Callback(Box::new(f)), true)
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.subs.remove(idx);
                true
            }
            None => false,
        }
    }

    /// True if the subscription is still registered.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.position(id).is_some()
    }

    /// Number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// True if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Delivers `ev` to every matching subscriber in registration order.
    ///
    /// Callbacks run in place. Routes that need the scheduler (watchers,
    /// awaiting tasks) are returned in the order they were reached; a bare bus
    /// without a scheduler simply has none of them.
    pub fn publish(&mut self, ev: &Event) -> Vec<Route> {
        let mut pending = Vec::new();
        for id in self.snapshot(ev) {
            match self.route(id, ev) {
                Some(Route::Delivered) | None => {}
                Some(route) => pending.push(route),
            }
        }
        pending
    }

    pub(crate) fn attach(&mut self, matcher: Matcher, sink: Sink, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subs.push(Subscription {
            id,
            matcher,
            sink,
            once,
        });
        id
    }

    /// Ids of the subscriptions that match `ev` right now, in registration order.
    pub(crate) fn snapshot(&self, ev: &Event) -> Vec<SubscriptionId> {
        self.subs
            .iter()
            .filter(|s| s.matcher.matches(ev))
            .map(|s| s.id)
            .collect()
    }

    /// Delivers `ev` to a single subscription taken from a snapshot.
    ///
    /// Returns `None` if the subscription was removed since the snapshot.
    pub(crate) fn route(&mut self, id: SubscriptionId, ev: &Event) -> Option<Route> {
        let idx = self.position(id)?;
        if self.subs[idx].once {
            let sub = self.subs.remove(idx);
            return Some(match sub.sink {
                Sink::Callback(mut f) => {
                    f(ev);
                    Route::Delivered
                }
                Sink::Watcher(w) => Route::Watcher(w),
                Sink::Awaiter(t) => Route::Awaiter(t),
            });
        }
        Some(match &mut self.subs[idx].sink {
            Sink::Callback(f) => {
                f(ev);
                Route::Delivered
            }
            Sink::Watcher(w) => Route::Watcher(*w),
            Sink::Awaiter(t) => Route::Awaiter(*t),
        })
    }

    fn position(&self, id: SubscriptionId) -> Option<usize> {
        self.subs.iter().position(|s| s.id == id)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subs.len())
            .finish()
    }
}
