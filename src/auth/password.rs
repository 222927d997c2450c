//! Password hashing and verification using bcrypt

use crate::core::error::{AuthError, Result};

/// Lowest cost bcrypt accepts (mirrors the private `BCRYPT_MIN_COST`)
pub(crate) const BCRYPT_MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts (mirrors the private `bcrypt::MAX_COST`)
pub(crate) const BCRYPT_MAX_COST: u32 = 31;

/// Salted one-way password hasher with a fixed work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Cheapest cost bcrypt accepts; only meant for tests
    pub fn minimum() -> Self {
        Self::new(BCRYPT_MIN_COST)
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String> {
        hash_password(password, self.cost)
    }
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::HashError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
///
/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
