//! # Watcher policies
//!
//! A watcher is a standing subscription that turns matching events into
//! tasks. Its policy decides what happens when a new matching event arrives
//! while a task it started earlier is still live.
//!
//! ## Variants
//! - `Take`: one at a time. The watcher consumes one event, runs one task to a
//!   terminal state, then re-arms. Events published while it is busy are not seen.
//! - `TakeEvery`: **fan-out**. Every event starts a new task; nothing is tracked or cancelled.
//! - `TakeLatest`: **supersede**. A new event cancels the previous task (if still live)
//!   and starts a new one.
//!
//! ## Invariants
//! - `TakeLatest` has at most one live task per watcher at any time.
//! - `Take` never has two tasks in flight; its second task cannot start before the first ends.
//! - `TakeEvery` imposes no bound.

use std::fmt;

/// Policy controlling how a watcher reacts to matching events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchPolicy {
    /// Serialize: take one event, run its task to the end, then wait again.
    ///
    /// Use when:
    /// - Operations must not overlap
    /// - Example: deletes against a remote store
    Take,

    /// Fan out: start a task for every event.
    ///
    /// Use when:
    /// - Requests are independent
    /// - Example: refreshing a list
    TakeEvery,

    /// Supersede: cancel the running task and start a new one.
    ///
    /// Use when:
    /// - A newer request invalidates the older one
    /// - Example: form submission where only the last one matters
    TakeLatest,
}

impl WatchPolicy {
    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            WatchPolicy::Take => "take",
            WatchPolicy::TakeEvery => "take_every",
            WatchPolicy::TakeLatest => "take_latest",
        }
    }
}

impl fmt::Display for WatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Identifier of a registered watcher (per scheduler).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(usize);

impl WatcherId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watcher-{}", self.0)
    }
}
