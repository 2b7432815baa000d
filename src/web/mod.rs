//! HTTP front end for depot.
//!
//! A small REST API over the file service, plus a health endpoint and
//! Swagger UI.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router, create_swagger_router};
pub use server::WebServer;
