//! Client side of the workflow: API calls and session state.

mod api;
mod controller;

pub use api::{ApiClient, ClientError};
pub use controller::Controller;
