//! Database migrations
//!
//! Versioned schema changes, each applied once inside its own transaction.

use crate::core::error::{AuthError, Result};
use rusqlite::Connection;
use tracing::{info, warn};

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT UNIQUE NOT NULL,
    encrypted_password TEXT NOT NULL,
    stage_name TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Auth cookie column (version 2)
const MIGRATION_V2: &str = r#"
ALTER TABLE users ADD COLUMN auth_cookie TEXT NOT NULL DEFAULT ' ';
CREATE INDEX IF NOT EXISTS idx_users_auth_cookie ON users(auth_cookie);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1), (2, MIGRATION_V2)];

/// Highest schema version known to this build
pub const LATEST_VERSION: i64 = 2;

/// Run all pending migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(MIGRATION_TABLE)
        .map_err(AuthError::DatabaseError)?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(AuthError::DatabaseError)?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            info!("Applying migration v{}", version);
            apply_migration(conn, *version, sql)?;
        }
    }

    Ok(())
}

/// Apply a single migration
fn apply_migration(conn: &mut Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.transaction().map_err(AuthError::DatabaseError)?;

    tx.execute_batch(sql).map_err(|e| {
        warn!("Migration v{} failed: {}", version, e);
        AuthError::DatabaseError(e)
    })?;

    tx.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])
        .map_err(AuthError::DatabaseError)?;

    tx.commit().map_err(AuthError::DatabaseError)?;

    info!("Migration v{} applied successfully", version);
    Ok(())
}
