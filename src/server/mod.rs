//! HTTP server wiring: router, shared state, and health endpoints.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
