//! Music Auth Backend
//!
//! Session-based authentication server for the music app.

use music_auth::core::config::{Config, StoreDriver};
use music_auth::{
    api, core, AppState, CookieSessionStore, DatabaseManager, MemoryUserRepository,
    PasswordHasher, SessionStore, SqlUserRepository, UserRepository,
};

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting authserver v{}", music_auth::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        allowed_origin = %config.security.allowed_origin,
        "Server configuration"
    );

    let hasher = PasswordHasher::new(config.security.bcrypt_cost);
    let users = build_user_store(&config, hasher)?;
    let sessions = build_session_store(&config);

    let server_url = format!("http://{}", config.bind_address());
    let server = api::ApiServer::new(&config, AppState { users, sessions, hasher })?;

    info!(url = %server_url, "Server ready - starting to serve requests");

    server.serve().await?;

    Ok(())
}

fn build_user_store(config: &Config, hasher: PasswordHasher) -> Result<Arc<dyn UserRepository>> {
    match config.database.driver {
        StoreDriver::Sqlite => {
            info!(path = ?config.database.path, "Initializing database...");
            let db = DatabaseManager::new(
                &config.database.path,
                config.database.connection_pool_size,
                std::time::Duration::from_millis(config.database.busy_timeout),
            )?;
            info!("Database initialized successfully");
            Ok(Arc::new(SqlUserRepository::new(Arc::new(db), hasher)))
        }
        StoreDriver::Memory => {
            warn!("Using in-memory user store, users are lost on restart");
            Ok(Arc::new(MemoryUserRepository::new(hasher)))
        }
    }
}

fn build_session_store(config: &Config) -> Arc<dyn SessionStore> {
    if config.security.session_key.is_empty() {
        warn!("No session_key configured, sessions will not survive a restart");
        Arc::new(CookieSessionStore::with_random_key())
    } else {
        Arc::new(CookieSessionStore::new(config.security.session_key.as_bytes().to_vec()))
    }
}
