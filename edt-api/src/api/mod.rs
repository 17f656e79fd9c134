//! HTTP API handlers for edt-api
//!
//! One module per resource; each exposes a `*_routes()` builder merged by
//! [`crate::build_router`].

pub mod callers;
pub mod dispatches;
pub mod health;
pub mod locations;
pub mod responders;
pub mod sessions;

pub use callers::caller_routes;
pub use dispatches::dispatch_routes;
pub use health::health_routes;
pub use locations::location_routes;
pub use responders::responder_routes;
pub use sessions::session_routes;
