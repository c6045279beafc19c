//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`], the centralized settings for a scheduler.
//!
//! ## Sentinel values
//! - `finished_capacity = 0` → terminal tasks are forgotten immediately
//! - `queue_capacity = 0` → clamped to 1

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// ## Field semantics
/// - `finished_capacity`: how many terminal task records are kept for `Scheduler::task`
/// - `queue_capacity`: bounded size of the [`SchedulerHandle`](crate::SchedulerHandle) submission queue
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Number of finished (`Completed` / `Cancelled` / `Failed`) task records retained.
    ///
    /// Oldest records are evicted first. Live tasks are always tracked.
    pub finished_capacity: usize,

    /// Capacity of the submission channel behind [`SchedulerHandle`](crate::SchedulerHandle).
    ///
    /// `try_submit` fails with `SubmitError::Full` once this many events are waiting.
    pub queue_capacity: usize,
}

impl SchedulerConfig {
    /// Returns the retention limit as an `Option`.
    ///
    /// - `None` → nothing retained
    /// - `Some(n)` → at most `n` finished records
    #[inline]
    pub fn finished_limit(&self) -> Option<usize> {
        match self.finished_capacity {
            0 => None,
            n => Some(n),
        }
    }

    /// Returns the submission queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `finished_capacity = 1024`
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            finished_capacity: 1024,
            queue_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let cfg = SchedulerConfig {
            finished_capacity: 0,
            queue_capacity: 0,
        };
        assert_eq!(cfg.finished_limit(), None);
        assert_eq!(cfg.queue_capacity_clamped(), 1);

        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.finished_limit(), Some(1024));
    }
}
