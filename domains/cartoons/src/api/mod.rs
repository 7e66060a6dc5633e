//! API layer for the Cartoons domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::CartoonsState;
pub use routes::routes;
