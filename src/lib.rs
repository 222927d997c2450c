//! Music Auth Backend Library
//!
//! This library provides the session-based authentication service,
//! including user storage, signed cookie sessions and the REST API.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use auth::{CookieSessionStore, PasswordHasher, SessionStore};
pub use crate::core::{AuthError, Config, Logger};
pub use db::{DatabaseManager, MemoryUserRepository, SqlUserRepository, User, UserRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
