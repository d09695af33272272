//! HTTP surface: routes, handlers, and the streaming service.
//!
//! Exposed as a library so integration tests can build the router against
//! a local storage backend and an in-memory catalog.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod streaming;

pub use routes::build_router;
pub use state::AppState;
