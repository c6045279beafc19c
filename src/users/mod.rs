//! # Users feature: list, create and delete orchestration.
//!
//! Wires three routines to the bus:
//!
//! | trigger                      | routine          | policy       |
//! |------------------------------|------------------|--------------|
//! | [`events::LIST_REQUESTED`]   | [`ListUsers`]    | `TakeEvery`  |
//! | [`events::CREATE_REQUESTED`] | create `Mutation`| `TakeLatest` |
//! | [`events::DELETE_REQUESTED`] | delete `Mutation`| `Take`       |
//!
//! Creates supersede each other (only the newest one reports); deletes are
//! serialized (the next one is not picked up until the current finishes).
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use sagavisor::{Scheduler, SchedulerConfig, TransportError};
//! use sagavisor::users::{self, NewUser, User, UserId, UserPage, UsersApi};
//!
//! struct Backend;
//!
//! #[async_trait::async_trait]
//! impl UsersApi for Backend {
//!     async fn fetch_list(&self, _limit: u32) -> Result<UserPage, TransportError> {
//!         Ok(UserPage::default())
//!     }
//!     async fn create_one(&self, _user: NewUser) -> Result<User, TransportError> {
//!         Err(TransportError::new("read-only"))
//!     }
//!     async fn delete_one(&self, _id: UserId) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() {
//! let mut sched = Scheduler::new(SchedulerConfig::default());
//! users::register(&mut sched, Arc::new(Backend));
//! sched.publish(users::events::list_requested());
//! sched.run_until_idle().await;
//! # }
//! ```

mod api;
pub mod events;
mod model;
mod routines;

use std::sync::Arc;

use tracing::info;

use crate::core::Scheduler;
use crate::policies::{WatchPolicy, WatcherId};

pub use api::{LIST_LIMIT, UsersApi};
pub use events::Outcome;
pub use model::{DeleteRequest, NewUser, User, UserId, UserPage};
pub use routines::{
    ListUsers, Mutation, UsersCalls, create_routine, delete_routine, list_routine,
};

/// Watchers installed by [`register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsersWatchers {
    pub list: WatcherId,
    pub create: WatcherId,
    pub delete: WatcherId,
}

/// Installs the users watchers on `sched`.
pub fn register(sched: &mut Scheduler, api: Arc<dyn UsersApi>) -> UsersWatchers {
    let calls = UsersCalls::new(api);
    let watchers = UsersWatchers {
        list: sched.register_watcher(
            events::LIST_REQUESTED,
            WatchPolicy::TakeEvery,
            list_routine(calls.clone()),
        ),
        create: sched.register_watcher(
            events::CREATE_REQUESTED,
            WatchPolicy::TakeLatest,
            create_routine(calls.clone()),
        ),
        delete: sched.register_watcher(
            events::DELETE_REQUESTED,
            WatchPolicy::Take,
            delete_routine(calls),
        ),
    };
    info!(?watchers, "users watchers registered");
    watchers
}
