//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - Signed cookie sessions
//! - Authentication middleware
//! - Login and auth cookie handlers

pub mod password;
pub mod session;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use password::{hash_password, verify_password, PasswordHasher};
pub use session::{CookieSessionStore, Session, SessionStore, SESSION_NAME};
pub use middleware::{authenticate, AuthUser};
pub use handlers::{check_cookie, create_session, update_cookie, whoami};
