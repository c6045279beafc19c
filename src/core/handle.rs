//! # Submission handle.
//!
//! [`SchedulerHandle`] lets code outside the scheduling thread feed events to a
//! scheduler that is driven by [`Scheduler::run`](crate::Scheduler::run).
//! Events are queued on a bounded channel and published in submission order.

use tokio::sync::mpsc;

use crate::error::SubmitError;
use crate::events::Event;

/// Handle for submitting events to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Event>,
}

impl SchedulerHandle {
    pub(super) fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Submit an event (async, waits if the queue is full).
    pub async fn submit(&self, event: Event) -> Result<(), SubmitError> {
        self.tx.send(event).await.map_err(|_| SubmitError::Closed)
    }

    /// Try to submit without waiting (fails if the queue is full).
    pub fn try_submit(&self, event: Event) -> Result<(), SubmitError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}
