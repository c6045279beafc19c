//! # Application events carried by the bus.
//!
//! An [`Event`] is a typed notification: a string [`EventKind`] plus an
//! optional structured payload. Watchers and awaiting tasks match on the kind
//! only. Events are immutable once built; the bus hands out `&Event`.
//!
//! ## Ordering
//! Each event gets a globally unique, monotonically increasing `seq` at
//! construction time. Delivery order is decided by the bus, not by `seq`;
//! the number is there for logs and for correlating observations in tests.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use sagavisor::Event;
//!
//! let ev = Event::new("users/delete_requested").with_payload(json!({ "id": 7 }));
//!
//! assert!(ev.is("users/delete_requested"));
//! assert_eq!(ev.payload().and_then(|p| p.get("id")), Some(&json!(7)));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Event classification (cheap to clone, compared by string value).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(Arc<str>);

impl EventKind {
    /// Creates a kind from any string-like value.
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self(kind.into())
    }

    /// Returns the kind as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&EventKind> for EventKind {
    fn from(k: &EventKind) -> Self {
        k.clone()
    }
}

impl Borrow<str> for EventKind {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for EventKind {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for EventKind {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Immutable notification published on the [`EventBus`](crate::EventBus).
///
/// - `kind` drives watcher matching
/// - `payload` is optional structured data (JSON)
/// - `seq` is a process-wide monotonic number assigned at construction
#[derive(Clone, Debug)]
pub struct Event {
    seq: u64,
    kind: EventKind,
    payload: Option<Value>,
}

impl Event {
    /// Creates a payload-less event of the given kind with the next sequence number.
    pub fn new(kind: impl Into<EventKind>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind: kind.into(),
            payload: None,
        }
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sequence number assigned at construction.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Event kind.
    #[inline]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Payload, if any.
    #[inline]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// True when the event is of the given kind.
    #[inline]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == *kind
    }

    /// Payload cloned into an owned value (`Value::Null` when absent).
    pub fn payload_or_null(&self) -> Value {
        self.payload.clone().unwrap_or(Value::Null)
    }

    /// Decodes the payload into `T` (an absent payload decodes from `null`).
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.payload {
            Some(v) => T::deserialize(v),
            None => T::deserialize(Value::Null),
        }
    }
}
