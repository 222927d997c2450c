//! In-process user repository
//!
//! Used by tests and by `database.driver = "memory"`. Users live in a map
//! guarded by one lock that also owns the id counter, so uniqueness checks
//! and id assignment happen atomically.

use crate::auth::password::PasswordHasher;
use crate::core::error::{AuthError, Result};
use crate::db::models::User;
use crate::db::repository::UserRepository;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

/// User repository backed by process memory
pub struct MemoryUserRepository {
    hasher: PasswordHasher,
    state: RwLock<MemoryState>,
}

impl MemoryUserRepository {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            hasher,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn find_where<P>(&self, predicate: P) -> Result<User>
    where
        P: Fn(&User) -> bool,
    {
        self.state
            .read()
            .await
            .users
            .values()
            .find(|user| predicate(user))
            .cloned()
            .ok_or(AuthError::RecordNotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User> {
        let hasher = self.hasher;
        let mut user = tokio::task::spawn_blocking(move || -> Result<User> {
            let mut user = user;
            user.validate()?;
            user.before_create(&hasher)?;
            Ok(user)
        })
        .await
        .map_err(|e| AuthError::StoreError(format!("Hashing task panicked: {}", e)))??;

        let mut state = self.state.write().await;
        if state.users.values().any(|existing| existing.login == user.login) {
            return Err(AuthError::Conflict);
        }

        state.last_id += 1;
        user.id = state.last_id;

        let mut stored = user.clone();
        stored.sanitize();
        state.users.insert(stored.id, stored);

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(AuthError::RecordNotFound)
    }

    async fn find_by_login(&self, login: &str) -> Result<User> {
        self.find_where(|user| user.login == login).await
    }

    async fn find_by_cookie(&self, cookie: &str) -> Result<User> {
        self.find_where(|user| user.auth_cookie == cookie).await
    }

    async fn update_cookie(&self, login: &str, cookie: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .values_mut()
            .find(|user| user.login == login)
            .ok_or(AuthError::RecordNotFound)?;

        user.auth_cookie = cookie.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn repo() -> MemoryUserRepository {
        MemoryUserRepository::new(PasswordHasher::minimum())
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repo();
        let created = repo.create(User::new("alice", "secret1", "Alice A")).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.password, "secret1");
        assert!(created.compare_password("secret1"));

        let found = repo.find_by_id(created.id).await.unwrap();
        assert!(found.password.is_empty());
        assert_eq!(found.encrypted_password, created.encrypted_password);

        assert_eq!(repo.find_by_login("alice").await.unwrap().id, created.id);
        assert!(matches!(repo.find_by_login("ALICE").await, Err(AuthError::RecordNotFound)));
        assert!(matches!(repo.find_by_id(2).await, Err(AuthError::RecordNotFound)));
    }

    #[tokio::test]
    async fn test_create_validation_and_conflict() {
        let repo = repo();

        let invalid = repo.create(User::new("alice", "123", "Alice")).await;
        assert!(matches!(invalid, Err(AuthError::ValidationError(_))));
        assert!(repo.is_empty().await);

        repo.create(User::new("alice", "secret1", "Alice")).await.unwrap();
        let duplicate = repo.create(User::new("alice", "secret2", "Other")).await;
        assert!(matches!(duplicate, Err(AuthError::Conflict)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_cookie_round_trip() {
        let repo = repo();
        let created = repo.create(User::new("alice", "secret1", "Alice")).await.unwrap();

        repo.update_cookie("alice", "fresh").await.unwrap();
        assert_eq!(repo.find_by_cookie("fresh").await.unwrap().id, created.id);
        assert!(matches!(repo.find_by_cookie(" ").await, Err(AuthError::RecordNotFound)));

        assert!(matches!(
            repo.update_cookie("nobody", "x").await,
            Err(AuthError::RecordNotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        let repo = Arc::new(repo());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(User::new(format!("user{}", i), "secret1", "Name")).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| *id > 0));
    }
}
