//! Document portal HTTP API
//!
//! axum handlers, session authentication, audit logging and application setup
//! over the portal services.

mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod utils;

pub use api_doc::{openapi, ApiDoc};
pub use error::{HttpAppError, ValidatedJson};
pub use state::AppState;
