//! Repository pattern implementation for data access layer
//!
//! `UserRepository` is the capability set every user store offers. The
//! SQLite-backed implementation lives here; the in-process one is in
//! [`crate::db::memory`].

use crate::auth::password::PasswordHasher;
use crate::core::error::{AuthError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::User;
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

/// Persistence of user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Validate, hash and insert a new user.
    ///
    /// The returned user carries its assigned id and still holds the
    /// plaintext password; callers must `sanitize` it before exposing it.
    async fn create(&self, user: User) -> Result<User>;

    /// Find a user by id
    async fn find_by_id(&self, id: i64) -> Result<User>;

    /// Find a user by login (case-sensitive), including its password hash
    async fn find_by_login(&self, login: &str) -> Result<User>;

    /// Find the user whose auth cookie equals `cookie` exactly
    async fn find_by_cookie(&self, cookie: &str) -> Result<User>;

    /// Overwrite the auth cookie of the user with the given login
    async fn update_cookie(&self, login: &str, cookie: &str) -> Result<()>;
}

const USER_COLUMNS: &str = "id, login, encrypted_password, stage_name, auth_cookie";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        password: String::new(),
        encrypted_password: row.get(2)?,
        stage_name: row.get(3)?,
        auth_cookie: row.get(4)?,
    })
}

fn map_insert_error(err: rusqlite::Error) -> AuthError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AuthError::Conflict
        }
        _ => AuthError::DatabaseError(err),
    }
}

/// SQLite-backed user repository
pub struct SqlUserRepository {
    db: Arc<DatabaseManager>,
    hasher: PasswordHasher,
}

impl SqlUserRepository {
    /// Create a new SqlUserRepository
    pub fn new(db: Arc<DatabaseManager>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    async fn find_one(&self, column: &'static str, value: rusqlite::types::Value) -> Result<User> {
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM users WHERE {} = ? ORDER BY id LIMIT 1",
                        USER_COLUMNS, column
                    ),
                    [value],
                    map_user,
                )
                .optional()
                .map_err(AuthError::DatabaseError)?
                .ok_or(AuthError::RecordNotFound)
            })
            .await
    }
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn create(&self, user: User) -> Result<User> {
        let hasher = self.hasher;

        // bcrypt runs before a pooled connection is taken so slow hashes
        // never starve lookups
        let mut user = tokio::task::spawn_blocking(move || -> Result<User> {
            let mut user = user;
            user.validate()?;
            user.before_create(&hasher)?;
            Ok(user)
        })
        .await
        .map_err(|e| AuthError::StoreError(format!("Hashing task panicked: {}", e)))??;

        let row = user.clone();
        user.id = self
            .db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (login, encrypted_password, stage_name, auth_cookie) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        &row.login,
                        &row.encrypted_password,
                        &row.stage_name,
                        &row.auth_cookie,
                    ],
                )
                .map_err(map_insert_error)?;

                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<User> {
        self.find_one("id", id.into()).await
    }

    async fn find_by_login(&self, login: &str) -> Result<User> {
        self.find_one("login", login.to_string().into()).await
    }

    async fn find_by_cookie(&self, cookie: &str) -> Result<User> {
        self.find_one("auth_cookie", cookie.to_string().into()).await
    }

    async fn update_cookie(&self, login: &str, cookie: &str) -> Result<()> {
        let login = login.to_string();
        let cookie = cookie.to_string();

        self.db
            .execute(move |conn| {
                let affected = conn
                    .execute(
                        "UPDATE users SET auth_cookie = ?1 WHERE login = ?2",
                        params![&cookie, &login],
                    )
                    .map_err(AuthError::DatabaseError)?;

                if affected == 0 {
                    return Err(AuthError::RecordNotFound);
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DEFAULT_AUTH_COOKIE;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_repo() -> (SqlUserRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("users.db");
        let db = DatabaseManager::new(&db_path, 4, Duration::from_secs(5)).unwrap();
        (
            SqlUserRepository::new(Arc::new(db), PasswordHasher::minimum()),
            temp_dir,
        )
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_hashes() {
        let (repo, _dir) = create_repo();

        let user = repo.create(User::new("alice", "secret1", "Alice A")).await.unwrap();
        assert!(user.id > 0);
        assert_ne!(user.encrypted_password, "secret1");
        assert!(user.compare_password("secret1"));

        let other = repo.create(User::new("bob", "secret2", "Bob")).await.unwrap();
        assert_ne!(user.id, other.id);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_user() {
        let (repo, _dir) = create_repo();

        let result = repo.create(User::new("alice!", "secret1", "Alice")).await;
        assert!(matches!(result, Err(AuthError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_login_conflicts() {
        let (repo, _dir) = create_repo();

        repo.create(User::new("alice", "secret1", "Alice")).await.unwrap();
        let result = repo.create(User::new("alice", "another1", "Other")).await;
        assert!(matches!(result, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn test_find_by_id_and_login() {
        let (repo, _dir) = create_repo();
        let created = repo.create(User::new("alice", "secret1", "Alice A")).await.unwrap();

        let by_id = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.login, "alice");
        assert_eq!(by_id.stage_name, "Alice A");
        assert_eq!(by_id.auth_cookie, DEFAULT_AUTH_COOKIE);
        assert!(by_id.password.is_empty());

        let by_login = repo.find_by_login("alice").await.unwrap();
        assert_eq!(by_login.id, created.id);
        assert!(by_login.compare_password("secret1"));

        assert!(matches!(repo.find_by_id(created.id + 100).await, Err(AuthError::RecordNotFound)));
        assert!(matches!(repo.find_by_login("Alice").await, Err(AuthError::RecordNotFound)));
    }

    #[tokio::test]
    async fn test_update_and_find_cookie() {
        let (repo, _dir) = create_repo();
        let created = repo.create(User::new("alice", "secret1", "Alice")).await.unwrap();

        repo.update_cookie("alice", "cookie-1").await.unwrap();
        assert_eq!(repo.find_by_cookie("cookie-1").await.unwrap().id, created.id);

        repo.update_cookie("alice", "cookie-2").await.unwrap();
        assert_eq!(repo.find_by_cookie("cookie-2").await.unwrap().id, created.id);
        assert!(matches!(repo.find_by_cookie("cookie-1").await, Err(AuthError::RecordNotFound)));
    }

    #[tokio::test]
    async fn test_update_cookie_unknown_login() {
        let (repo, _dir) = create_repo();

        let result = repo.update_cookie("ghost", "cookie").await;
        assert!(matches!(result, Err(AuthError::RecordNotFound)));
    }

    #[tokio::test]
    async fn test_lookup_not_blocked_by_registration_hash() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseManager::new(&temp_dir.path().join("users.db"), 1, Duration::from_secs(5))
            .unwrap();
        let repo = Arc::new(SqlUserRepository::new(Arc::new(db), PasswordHasher::new(12)));

        let registering = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.create(User::new("alice", "secret1", "Alice")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the only pooled connection stays free while bcrypt runs
        let lookup = repo.find_by_id(1).await;
        assert!(matches!(lookup, Err(AuthError::RecordNotFound)));
        assert!(!registering.is_finished());

        let created = registering.await.unwrap().unwrap();
        assert_eq!(repo.find_by_id(created.id).await.unwrap().login, "alice");
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registrations() {
        let (repo, _dir) = create_repo();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(User::new("alice", "secret1", "Alice")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AuthError::Conflict) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(created, 1);
    }
}
