//! # LogWriter: lifecycle events to `tracing`
//!
//! A minimal subscriber that forwards incoming [`TaskEvent`]s to `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG sagavisor: task started task=task-3 name=users.create parent=None
//! DEBUG sagavisor: task suspended task=task-3 name=users.create effect=invoke
//!  INFO sagavisor: task cancelled task=task-3 name=users.create
//! DEBUG sagavisor: result discarded task=task-3 name=users.create
//!  WARN sagavisor: task failed task=task-9 name=probe reason="transport: refused"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::subscribers::Subscribe;
use crate::subscribers::task_event::{TaskEvent, TaskEventKind};

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &TaskEvent) {
        let task = e.task;
        let name = &*e.name;
        match e.kind {
            TaskEventKind::TaskStarted => {
                debug!(target: "sagavisor", %task, name, parent = ?e.parent, "task started");
            }
            TaskEventKind::TaskSuspended => {
                debug!(target: "sagavisor", %task, name, effect = e.effect.unwrap_or("unknown"), "task suspended");
            }
            TaskEventKind::TaskCompleted => {
                debug!(target: "sagavisor", %task, name, "task completed");
            }
            TaskEventKind::TaskCancelled => {
                info!(target: "sagavisor", %task, name, "task cancelled");
            }
            TaskEventKind::ResultDiscarded => {
                debug!(target: "sagavisor", %task, name, "result discarded");
            }
            TaskEventKind::TaskFailed => {
                warn!(
                    target: "sagavisor",
                    %task,
                    name,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "task failed"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::tasks::TaskId;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn line_for<'a>(out: &'a str, message: &str) -> &'a str {
        out.lines()
            .find(|l| l.contains(message))
            .unwrap_or_else(|| panic!("no line for {message:?} in:\n{out}"))
    }

    #[tokio::test]
    async fn maps_lifecycle_onto_levels() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let writer = LogWriter::new();
        let name: Arc<str> = Arc::from("users.create");
        let task = TaskId::new(3);
        writer
            .on_event(&TaskEvent::new(TaskEventKind::TaskStarted, task, name.clone()))
            .await;
        writer
            .on_event(&TaskEvent::new(TaskEventKind::TaskCancelled, task, name.clone()))
            .await;
        writer
            .on_event(
                &TaskEvent::new(TaskEventKind::TaskFailed, task, name).with_reason("transport: refused"),
            )
            .await;

        let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(line_for(&out, "task started").contains("DEBUG"));
        assert!(line_for(&out, "task cancelled").contains("INFO"));
        let failed = line_for(&out, "task failed");
        assert!(failed.contains("WARN"));
        assert!(failed.contains("transport: refused"));
        assert!(failed.contains("task=task-3"));
    }
}
