pub mod users;

pub use users::*;

use crate::auth::password::PasswordHasher;
use crate::auth::session::SessionStore;
use crate::db::repository::UserRepository;
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
    /// Work factor used for registrations, also spent on logins for unknown users
    pub hasher: PasswordHasher,
}
