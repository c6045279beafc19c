//! # Task table.
//!
//! [`Registry`] owns every task the scheduler created:
//! - **live** entries (`Running` / `Suspended`) with their routine state, token,
//!   pending `AwaitOne` subscription and spawned children;
//! - a bounded history of **finished** [`TaskInfo`] records.
//!
//! ## Rules
//! - A task leaves the live table exactly once (`retire`), at which point its
//!   routine is dropped and its record moves to the history.
//! - "Is it still live?" is answered by presence in the live table; every
//!   resumption path checks it first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::SubscriptionId;
use crate::policies::WatcherId;
use crate::tasks::{BoxRoutine, TaskId, TaskInfo, TaskStatus};

/// A live task.
pub(super) struct TaskEntry {
    pub name: Arc<str>,
    /// Taken out while the routine is being resumed.
    pub routine: Option<BoxRoutine>,
    pub status: TaskStatus,
    pub token: CancellationToken,
    pub parent: Option<TaskId>,
    pub watcher: Option<WatcherId>,
    pub children: Vec<TaskId>,
    /// One-shot subscription while parked on `AwaitOne`.
    pub wait: Option<SubscriptionId>,
}

/// Live tasks plus bounded history of finished ones.
pub(super) struct Registry {
    live: HashMap<TaskId, TaskEntry>,
    finished: VecDeque<TaskInfo>,
    limit: Option<usize>,
    next_id: u64,
}

impl Registry {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            live: HashMap::new(),
            finished: VecDeque::new(),
            limit,
            next_id: 1,
        }
    }

    /// Adds a new `Running` task.
    pub fn insert(
        &mut self,
        routine: BoxRoutine,
        token: CancellationToken,
        parent: Option<TaskId>,
        watcher: Option<WatcherId>,
    ) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        let entry = TaskEntry {
            name: Arc::from(routine.name()),
            routine: Some(routine),
            status: TaskStatus::Running,
            token,
            parent,
            watcher,
            children: Vec::new(),
            wait: None,
        };
        self.live.insert(id, entry);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskEntry> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut TaskEntry> {
        self.live.get_mut(&id)
    }

    pub fn is_live(&self, id: TaskId) -> bool {
        self.live.contains_key(&id)
    }

    /// Moves a live task into the history with its terminal status.
    pub fn retire(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<TaskError>,
    ) -> Option<(TaskEntry, TaskInfo)> {
        debug_assert!(status.is_terminal());
        let mut entry = self.live.remove(&id)?;
        entry.routine = None;
        entry.status = status;
        let info = TaskInfo {
            id,
            name: entry.name.clone(),
            status,
            parent: entry.parent,
            watcher: entry.watcher,
            result,
            error,
        };
        if let Some(limit) = self.limit {
            if self.finished.len() == limit {
                self.finished.pop_front();
            }
            self.finished.push_back(info.clone());
        }
        Some((entry, info))
    }

    /// Snapshot of a live or remembered task.
    pub fn info(&self, id: TaskId) -> Option<TaskInfo> {
        if let Some(e) = self.live.get(&id) {
            return Some(TaskInfo {
                id,
                name: e.name.clone(),
                status: e.status,
                parent: e.parent,
                watcher: e.watcher,
                result: None,
                error: None,
            });
        }
        self.finished.iter().rev().find(|i| i.id == id).cloned()
    }

    /// Sorted ids of live tasks.
    pub fn live_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.live.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Sequence;

    fn routine() -> BoxRoutine {
        Box::new(Sequence::new("noop", Vec::new()))
    }

    #[test]
    fn retire_moves_to_bounded_history() {
        let mut reg = Registry::new(Some(1));
        let a = reg.insert(routine(), CancellationToken::new(), None, None);
        let b = reg.insert(routine(), CancellationToken::new(), None, None);
        assert_eq!(reg.live_ids(), vec![a, b]);

        let (_, info) = reg.retire(a, TaskStatus::Completed, Some(Value::Null), None).unwrap();
        assert_eq!(info.status, TaskStatus::Completed);
        assert!(!reg.is_live(a));
        assert!(reg.retire(a, TaskStatus::Cancelled, None, None).is_none());
        assert_eq!(reg.info(a).map(|i| i.status), Some(TaskStatus::Completed));

        reg.retire(b, TaskStatus::Cancelled, None, None);
        assert!(reg.info(a).is_none(), "evicted by capacity");
        assert_eq!(reg.info(b).map(|i| i.status), Some(TaskStatus::Cancelled));
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut reg = Registry::new(None);
        let a = reg.insert(routine(), CancellationToken::new(), None, None);
        reg.retire(a, TaskStatus::Failed, None, None);
        assert!(reg.info(a).is_none());
    }
}
