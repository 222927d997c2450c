//! REST API module
//!
//! This module provides the HTTP server and REST API endpoints including:
//! - API routing and request handling
//! - Request id tagging and CORS for the public routes
//! - Shared handler state

pub mod server;
pub mod routes;
pub mod middleware;
pub mod handlers;

pub use server::ApiServer;
pub use handlers::AppState;
pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
