use std::sync::Arc;

use super::{config::SchedulerConfig, scheduler::Scheduler};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a Scheduler with optional features.
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets lifecycle subscribers for observability.
    ///
    /// Subscribers receive task lifecycle events through dedicated workers
    /// with bounded queues. A non-empty list requires a tokio runtime at
    /// [`build`](Self::build) time.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single lifecycle subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds and returns the Scheduler instance.
    ///
    /// This consumes the builder and initializes:
    /// - the event bus and task table
    /// - subscriber workers
    /// - the submission channel behind [`SchedulerHandle`](crate::SchedulerHandle)
    pub fn build(self) -> Scheduler {
        let subs = SubscriberSet::new(self.subscribers);
        Scheduler::new_internal(self.cfg, subs)
    }
}
