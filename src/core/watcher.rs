//! # Watcher state.
//!
//! One [`Watcher`] per `register_watcher` call. Watchers live as long as the
//! scheduler; there is no teardown.
//!
//! ## Per-policy state
//! ```text
//! Take        subscription: Some while armed, None while its task runs
//!             active:       the running task (re-arms when it ends)
//! TakeEvery   subscription: always Some
//!             active:       last task started (informational)
//! TakeLatest  subscription: always Some
//!             active:       the one live task, cancelled on the next event
//! ```

use crate::events::{EventKind, SubscriptionId};
use crate::policies::{WatchPolicy, WatcherId};
use crate::tasks::{RoutineRef, TaskId};

pub(super) struct Watcher {
    pub id: WatcherId,
    pub kind: EventKind,
    pub policy: WatchPolicy,
    pub routine: RoutineRef,
    pub active: Option<TaskId>,
    pub subscription: Option<SubscriptionId>,
}

impl Watcher {
    pub fn new(
        id: WatcherId,
        kind: EventKind,
        policy: WatchPolicy,
        routine: RoutineRef,
        subscription: SubscriptionId,
    ) -> Self {
        Self {
            id,
            kind,
            policy,
            routine,
            active: None,
            subscription: Some(subscription),
        }
    }

    /// `Take` watchers use a one-shot subscription that is re-armed after each task.
    pub fn one_shot(policy: WatchPolicy) -> bool {
        matches!(policy, WatchPolicy::Take)
    }
}
