//! Error types used by the sagavisor runtime and routines.
//!
//! This module defines the error enums that cross component boundaries:
//!
//! - [`TransportError`]: an `Invoke`d operation rejected (the only error kind
//!   that reaches the orchestrator from the outside world).
//! - [`TaskError`]: the terminal failure recorded on a `Failed` task.
//! - [`SubmitError`]: an event could not be queued through a
//!   [`SchedulerHandle`](crate::SchedulerHandle).
//!
//! All types provide `as_label` (stable snake_case label for logs) and
//! `as_message` helpers.

use thiserror::Error;

/// # Failure reported by an external async operation.
///
/// The orchestrator only distinguishes success from failure; the message is
/// kept for diagnostics and is never forwarded into emitted events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// Free-form description from the transport.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sagavisor::TransportError;
    ///
    /// let err = TransportError::new("connection refused");
    /// assert_eq!(err.as_label(), "transport_failure");
    /// ```
    pub fn as_label(&self) -> &'static str {
        "transport_failure"
    }

    /// Returns a human-readable message.
    pub fn as_message(&self) -> String {
        format!("transport: {}", self.message)
    }
}

/// # Terminal failure of a task.
///
/// Recorded when a routine finishes with an error it did not handle itself.
/// Nothing is published on the event bus for these; the routine's own contract
/// decides what (if anything) is reported.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// An `Invoke` failure reached the top of the routine uncaught.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An `Invoke` result could not be decoded into the type the routine expects.
    #[error("routine '{routine}' could not decode result: {error}")]
    Decode {
        /// Name of the routine that received the value.
        routine: String,
        /// Decoder message.
        error: String,
    },
}

impl TaskError {
    /// Creates a decode error for the named routine.
    pub fn decode(routine: impl Into<String>, err: impl std::fmt::Display) -> Self {
        TaskError::Decode {
            routine: routine.into(),
            error: err.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use sagavisor::{TaskError, TransportError};
    ///
    /// let err = TaskError::from(TransportError::new("boom"));
    /// assert_eq!(err.as_label(), "task_transport");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Transport(_) => "task_transport",
            TaskError::Decode { .. } => "task_decode",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Transport(e) => e.as_message(),
            TaskError::Decode { routine, error } => format!("decode in {routine}: {error}"),
        }
    }
}

/// # Errors returned when submitting events through a handle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The submission queue is at capacity.
    #[error("submission queue is full")]
    Full,

    /// The scheduler loop is gone.
    #[error("scheduler is closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "submit_full",
            SubmitError::Closed => "submit_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_converts_into_task_error() {
        let err: TaskError = TransportError::new("refused").into();
        assert_eq!(err.as_label(), "task_transport");
        assert_eq!(err.to_string(), "transport failure: refused");
    }

    #[test]
    fn decode_error_names_routine() {
        let err = TaskError::decode("users.list", "missing field `items`");
        assert_eq!(err.as_label(), "task_decode");
        assert!(err.as_message().contains("users.list"));
    }
}
