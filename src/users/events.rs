//! Bus vocabulary of the users feature.
//!
//! ## Inbound (from the state store)
//! - [`LIST_REQUESTED`]: no payload
//! - [`CREATE_REQUESTED`]: `{ firstName, lastName }`
//! - [`DELETE_REQUESTED`]: `{ id }` (or `{ userId }`)
//!
//! ## Outbound (from the routines)
//! - [`LIST_SUCCEEDED`]: `{ items: [User] }`
//! - [`OPERATION_FAILED`]: `{ message }`, one of [`GET_FAILED`],
//!   [`CREATE_FAILED`], [`DELETE_FAILED`]

use serde_json::json;

use crate::events::Event;
use crate::users::model::{NewUser, UserId, UserPage};

pub const LIST_REQUESTED: &str = "users/list_requested";
pub const LIST_SUCCEEDED: &str = "users/list_succeeded";
pub const CREATE_REQUESTED: &str = "users/create_requested";
pub const DELETE_REQUESTED: &str = "users/delete_requested";
pub const OPERATION_FAILED: &str = "users/operation_failed";

pub const GET_FAILED: &str = "An error occurred when trying to get the user";
pub const CREATE_FAILED: &str = "An error occurred when trying to create the user";
pub const DELETE_FAILED: &str = "An error occurred when trying to delete the user";

pub fn list_requested() -> Event {
    Event::new(LIST_REQUESTED)
}

pub fn create_requested(user: &NewUser) -> Event {
    Event::new(CREATE_REQUESTED).with_payload(json!({
        "firstName": user.first_name,
        "lastName": user.last_name,
    }))
}

pub fn delete_requested(id: UserId) -> Event {
    Event::new(DELETE_REQUESTED).with_payload(json!({ "id": id }))
}

pub fn list_succeeded(page: &UserPage) -> Event {
    Event::new(LIST_SUCCEEDED).with_payload(json!({ "items": page.items }))
}

pub fn operation_failed(message: &str) -> Event {
    Event::new(OPERATION_FAILED).with_payload(json!({ "message": message }))
}

/// Terminal result of a users routine, as seen by a bus subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ListSucceeded(UserPage),
    OperationFailed(String),
}

impl Outcome {
    /// Decodes an outbound event; `None` for any other kind or a malformed payload.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.is(LIST_SUCCEEDED) {
            return event.decode::<UserPage>().ok().map(Outcome::ListSucceeded);
        }
        if event.is(OPERATION_FAILED) {
            let message = event.payload()?.get("message")?.as_str()?;
            return Some(Outcome::OperationFailed(message.to_owned()));
        }
        None
    }
}
