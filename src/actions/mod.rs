//! Request-scoped actions behind the forms and the JSON API.
//!
//! Auth actions always end in a redirect. Task actions return a domain result
//! and leave re-rendering to the caller.

pub mod auth;
pub mod confirm;
pub mod tasks;

pub use auth::{AuthRedirect, SessionChange};
pub use confirm::ConfirmParams;
