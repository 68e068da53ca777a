//! Axum routes, handlers, and DTOs for the proxy protocol.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::ProxyAppState;
pub use routes::proxy_router;
