//! Transport boundary for the users backend.
//!
//! Implementations talk to the real service (or a test double). The
//! orchestrator only distinguishes success from failure, so every error is a
//! plain [`TransportError`].

use async_trait::async_trait;

use crate::error::TransportError;
use crate::users::model::{NewUser, User, UserId, UserPage};

/// Page size requested by the list routine.
pub const LIST_LIMIT: u32 = 1000;

/// # Users backend.
///
/// Calls are started from the scheduling thread and polled there; they may
/// outlive the task that issued them (the result is then discarded).
#[async_trait]
pub trait UsersApi: Send + Sync + 'static {
    /// Fetches up to `limit` users.
    async fn fetch_list(&self, limit: u32) -> Result<UserPage, TransportError>;

    /// Creates a user and returns the stored record.
    async fn create_one(&self, user: NewUser) -> Result<User, TransportError>;

    /// Deletes a user by id.
    async fn delete_one(&self, id: UserId) -> Result<(), TransportError>;
}
