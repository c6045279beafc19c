//! # External async operations (`Invoke` targets).
//!
//! [`Call`] is the boundary to the transport layer: a named operation that
//! takes JSON arguments and produces a `'static` future resolving to a JSON
//! value or a [`TransportError`]. [`CallFn`] wraps a closure so operations can
//! be written inline; [`CallRef`] is the shared handle stored in effects.
//!
//! ## Cancellation
//! Each call receives a [`CancellationToken`] derived from the invoking task's
//! token. Operations may observe it and return early, but the scheduler never
//! relies on that: the result of a cancelled task's call is discarded.
//!
//! ## Example
//! ```rust
//! use serde_json::{Value, json};
//! use tokio_util::sync::CancellationToken;
//! use sagavisor::{CallFn, CallRef, TransportError};
//!
//! let echo: CallRef = CallFn::arc("echo", |args: Value, _ctx: CancellationToken| async move {
//!     Ok::<_, TransportError>(json!({ "echo": args }))
//! });
//!
//! assert_eq!(echo.name(), "echo");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Boxed future produced by a [`Call`].
pub type BoxCallFuture = BoxFuture<'static, Result<Value, TransportError>>;

/// Shared handle to an operation (`Arc<dyn Call>`).
pub type CallRef = Arc<dyn Call>;

/// # Named asynchronous operation.
///
/// Implementations must produce a **fresh** future per call; the future must
/// not borrow from `self`.
pub trait Call: Send + Sync + 'static {
    /// Stable, human-readable operation name (for logs).
    fn name(&self) -> &str;

    /// Starts the operation.
    fn call(&self, args: Value, ctx: CancellationToken) -> BoxCallFuture;
}

/// Function-backed operation.
///
/// Wraps a closure that *creates* a new future per call.
#[derive(Debug)]
pub struct CallFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> CallFn<F> {
    /// Creates a new function-backed operation.
    ///
    /// Prefer [`CallFn::arc`] when you immediately need a [`CallRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the operation and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Call for CallFn<F>
where
    F: Fn(Value, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TransportError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: Value, ctx: CancellationToken) -> BoxCallFuture {
        Box::pin((self.f)(args, ctx))
    }
}
