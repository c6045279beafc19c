//! # Lifecycle fan-out.
//!
//! The scheduling thread must never wait on an observer, so [`SubscriberSet`]
//! gives every [`Subscribe`] implementation its own bounded lane and worker:
//!
//! ```text
//! Scheduler::notify ─► emit(TaskEvent) ─► Arc<TaskEvent>
//!                                          ├─ try_send ─► lane "log"     ─► worker ─► on_event
//!                                          ├─ try_send ─► lane "metrics" ─► worker ─► on_event
//!                                          └─ try_send ─► lane ...       (full? drop + count)
//! ```
//!
//! ## Rules
//! - `emit` never awaits; ordering holds per lane only.
//! - A full or closed lane drops the event for that subscriber and bumps its
//!   drop counter (see [`SubscriberSet::dropped`]).
//! - A panic in `on_event` is caught and logged; the worker keeps draining.
//! - Workers are spawned on the ambient tokio runtime, so a non-empty set must
//!   be built from inside one. An empty set spawns nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::Subscribe;
use super::task_event::TaskEvent;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<TaskEvent>>,
    dropped: AtomicU64,
}

/// Observers of task lifecycle events, each behind its own queue.
#[derive(Default)]
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
}

fn spawn_worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<TaskEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let delivery = std::panic::AssertUnwindSafe(sub.on_event(&ev)).catch_unwind();
            if let Err(panic) = delivery.await {
                warn!(subscriber = sub.name(), task = %ev.task, ?panic, "subscriber panicked");
            }
        }
    })
}

impl SubscriberSet {
    /// Opens one lane per subscriber and starts its worker.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut set = Self::default();
        for sub in subs {
            let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
            set.lanes.push(Lane {
                name: sub.name(),
                tx,
                dropped: AtomicU64::new(0),
            });
            set.workers.push(spawn_worker(sub, rx));
        }
        set
    }

    /// Queues `event` on every lane without waiting.
    pub fn emit(&self, event: TaskEvent) {
        if self.lanes.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for lane in &self.lanes {
            let Err(err) = lane.tx.try_send(Arc::clone(&event)) else {
                continue;
            };
            lane.dropped.fetch_add(1, Ordering::Relaxed);
            let cause = match err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "worker closed",
            };
            warn!(subscriber = lane.name, task = %event.task, cause, "lifecycle event dropped");
        }
    }

    /// Events dropped so far for the named subscriber.
    pub fn dropped(&self, name: &str) -> Option<u64> {
        self.lanes
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.dropped.load(Ordering::Relaxed))
    }

    /// Closes every lane and waits for the workers to drain it.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}
