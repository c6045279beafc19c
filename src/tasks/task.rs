//! # Task identity and status.
//!
//! A task is a live instance of a [`Routine`](crate::Routine) owned by the
//! [`Scheduler`](crate::Scheduler). This module holds the small value types
//! that describe one: [`TaskId`], [`TaskStatus`] and the read-only [`TaskInfo`]
//! snapshot returned by `Scheduler::task`.
//!
//! ## Status transitions
//! ```text
//!            ┌────────── resume ──────────┐
//!            ▼                            │
//! start ─► Running ─► Invoke / AwaitOne ─► Suspended
//!            │
//!            ├─► routine returns        ─► Completed
//!            ├─► routine fails          ─► Failed
//!            └─► superseded / parent    ─► Cancelled   (also from Suspended)
//! ```
//! Every task reaches exactly one terminal status, or stays `Suspended`
//! while parked on an event that never arrives.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TaskError;
use crate::policies::WatcherId;

/// Process-unique task identifier (per scheduler).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle status of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Executing synchronous routine code.
    Running,
    /// Parked on an in-flight `Invoke` or an `AwaitOne`.
    Suspended,
    /// The routine returned.
    Completed,
    /// Cancelled by the scheduler; future resumption is suppressed.
    Cancelled,
    /// The routine ended with an unhandled error.
    Failed,
}

impl TaskStatus {
    /// True for `Completed`, `Cancelled` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed
        )
    }

    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Suspended => "suspended",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Read-only snapshot of a task.
#[derive(Clone, Debug)]
pub struct TaskInfo {
    /// Task identifier.
    pub id: TaskId,
    /// Name of the routine the task runs.
    pub name: Arc<str>,
    /// Current (or final) status.
    pub status: TaskStatus,
    /// Task that spawned this one, if any.
    pub parent: Option<TaskId>,
    /// Watcher that started this task, if any.
    pub watcher: Option<WatcherId>,
    /// Value the routine returned (`Completed` only).
    pub result: Option<Value>,
    /// Error the routine ended with (`Failed` only).
    pub error: Option<TaskError>,
}
