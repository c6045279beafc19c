//! # Task lifecycle notifications.
//!
//! [`TaskEvent`] is what observers see: one record per lifecycle step of a
//! task. These are diagnostics; they never travel on the application
//! [`EventBus`](crate::EventBus) and never trigger watchers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::TaskId;

/// Global sequence counter for lifecycle ordering.
static TASK_EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEventKind {
    /// Task created and about to take its first step.
    ///
    /// Sets:
    /// - `parent`: spawning task, if any
    TaskStarted,

    /// Task parked on an effect.
    ///
    /// Sets:
    /// - `effect`: `"invoke"` or `"await_one"`
    TaskSuspended,

    /// Routine returned.
    TaskCompleted,

    /// Task cancelled (superseded, or its spawner was cancelled).
    TaskCancelled,

    /// Routine ended with an unhandled error.
    ///
    /// Sets:
    /// - `reason`: error message
    TaskFailed,

    /// An `Invoke` finished for a task that was already cancelled; the value was dropped.
    ResultDiscarded,
}

/// Lifecycle notification with optional metadata.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: TaskEventKind,
    /// Task the event is about.
    pub task: TaskId,
    /// Routine name.
    pub name: Arc<str>,
    /// Spawning task, if any.
    pub parent: Option<TaskId>,
    /// Effect label the task is parked on.
    pub effect: Option<&'static str>,
    /// Human-readable reason (failures).
    pub reason: Option<Arc<str>>,
}

impl TaskEvent {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn new(kind: TaskEventKind, task: TaskId, name: Arc<str>) -> Self {
        Self {
            seq: TASK_EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task,
            name,
            parent: None,
            effect: None,
            reason: None,
        }
    }

    /// Attaches the spawning task.
    #[inline]
    pub fn with_parent(mut self, parent: Option<TaskId>) -> Self {
        self.parent = parent;
        self
    }

    /// Attaches the effect label.
    #[inline]
    pub fn with_effect(mut self, effect: &'static str) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            TaskEventKind::TaskCompleted | TaskEventKind::TaskCancelled | TaskEventKind::TaskFailed
        )
    }
}
