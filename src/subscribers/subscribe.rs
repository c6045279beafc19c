//! # Lifecycle observer trait
//!
//! [`Subscribe`] is how hosts watch tasks move through their statuses without
//! touching the application bus. Every implementation gets a private queue
//! and worker inside the [`SubscriberSet`](crate::SubscriberSet), so it may be
//! slow (I/O, batching) without stalling the scheduler or its peers.
//!
//! A subscriber that falls behind loses events once its queue
//! ([`Subscribe::queue_capacity`]) is full.
//!
//! ## Example
//! ```rust
//! use sagavisor::{Subscribe, TaskEvent, TaskEventKind};
//!
//! struct FailureAudit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureAudit {
//!     async fn on_event(&self, ev: &TaskEvent) {
//!         if ev.kind == TaskEventKind::TaskFailed {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-audit" }
//!     fn queue_capacity(&self) -> usize { 512 }
//! }
//! ```

use async_trait::async_trait;

use super::task_event::TaskEvent;

/// Observer of task lifecycle events.
///
/// `on_event` runs on the subscriber's own worker task; keep it async-friendly
/// (no blocking calls on the runtime threads).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one lifecycle event.
    async fn on_event(&self, event: &TaskEvent);

    /// Name used in logs and by [`SubscriberSet::dropped`](crate::SubscriberSet::dropped).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (at least 1 is used).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
