//! Database models
//!
//! Data structures representing database tables

use crate::auth::password::{verify_password, PasswordHasher};
use crate::core::error::{AuthError, Result};
use serde::Serialize;

/// Auth cookie stored for a user that never set one
pub const DEFAULT_AUTH_COOKIE: &str = " ";

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const STAGE_NAME_MIN_LEN: usize = 1;
pub const STAGE_NAME_MAX_LEN: usize = 60;

/// User record in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    /// Plaintext password, only present between registration and `sanitize`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip)]
    pub encrypted_password: String,
    pub stage_name: String,
    #[serde(rename = "music_auth_cookie")]
    pub auth_cookie: String,
}

impl User {
    /// A not yet persisted user
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        stage_name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            login: login.into(),
            password: password.into(),
            encrypted_password: String::new(),
            stage_name: stage_name.into(),
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
        }
    }

    /// Check login, password and stage name constraints.
    ///
    /// All violated fields are reported in one `ValidationError`.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.login.is_empty() {
            problems.push("login: cannot be blank".to_string());
        } else if !self.login.chars().all(char::is_alphanumeric) {
            problems.push("login: must contain letters and digits only".to_string());
        }

        if self.password.is_empty() {
            if self.encrypted_password.is_empty() {
                problems.push("password: cannot be blank".to_string());
            }
        } else {
            let len = self.password.chars().count();
            if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
                problems.push(format!(
                    "password: the length must be between {} and {}",
                    PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
                ));
            }
        }

        let len = self.stage_name.chars().count();
        if len == 0 {
            problems.push("stage_name: cannot be blank".to_string());
        } else if len > STAGE_NAME_MAX_LEN {
            problems.push(format!(
                "stage_name: the length must be between {} and {}",
                STAGE_NAME_MIN_LEN, STAGE_NAME_MAX_LEN
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AuthError::ValidationError(problems.join("; ")))
        }
    }

    /// Hash the plaintext password into `encrypted_password`
    pub fn before_create(&mut self, hasher: &PasswordHasher) -> Result<()> {
        if !self.password.is_empty() {
            self.encrypted_password = hasher.hash(&self.password)?;
        }
        Ok(())
    }

    /// Drop the plaintext password before the user leaves the service
    pub fn sanitize(&mut self) {
        self.password.clear();
    }

    pub fn compare_password(&self, password: &str) -> bool {
        verify_password(password, &self.encrypted_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_user() -> User {
        User::new("alice", "secret1", "Alice A")
    }

    #[test]
    fn test_new_user_defaults() {
        let user = valid_user();
        assert_eq!(user.id, 0);
        assert_eq!(user.auth_cookie, DEFAULT_AUTH_COOKIE);
        assert!(user.encrypted_password.is_empty());
    }

    #[test]
    fn test_validate_accepts_valid_user() {
        assert!(valid_user().validate().is_ok());
        assert!(User::new("Ünïcode42", "secret1", "X").validate().is_ok());
    }

    #[test]
    fn test_validate_login() {
        let mut user = valid_user();
        user.login = String::new();
        assert!(matches!(user.validate(), Err(AuthError::ValidationError(m)) if m.contains("login")));

        user.login = "alice smith".to_string();
        assert!(user.validate().is_err());

        user.login = "alice@example".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_validate_password() {
        let mut user = valid_user();
        user.password = "short".to_string();
        assert!(matches!(user.validate(), Err(AuthError::ValidationError(m)) if m.contains("password")));

        user.password = "x".repeat(PASSWORD_MAX_LEN + 1);
        assert!(user.validate().is_err());

        user.password = "x".repeat(PASSWORD_MAX_LEN);
        assert!(user.validate().is_ok());

        user.password = String::new();
        assert!(user.validate().is_err());

        // an existing hash makes the plaintext optional
        user.encrypted_password = "$2b$04$existing".to_string();
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_validate_stage_name() {
        let mut user = valid_user();
        user.stage_name = String::new();
        assert!(user.validate().is_err());

        user.stage_name = "é".repeat(STAGE_NAME_MAX_LEN);
        assert!(user.validate().is_ok());

        user.stage_name = "é".repeat(STAGE_NAME_MAX_LEN + 1);
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_validate_reports_every_field() {
        let user = User::new("", "", "");
        let message = user.validate().unwrap_err().to_string();
        assert!(message.contains("login"));
        assert!(message.contains("password"));
        assert!(message.contains("stage_name"));
    }

    #[test]
    fn test_before_create_and_compare() {
        let mut user = valid_user();
        user.before_create(&PasswordHasher::minimum()).unwrap();

        assert!(!user.encrypted_password.is_empty());
        assert_ne!(user.encrypted_password, user.password);
        assert!(user.compare_password("secret1"));
        assert!(!user.compare_password("wrong"));
    }

    #[test]
    fn test_sanitize_hides_secrets_from_json() {
        let mut user = valid_user();
        user.id = 7;
        user.before_create(&PasswordHasher::minimum()).unwrap();

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["password"], "secret1");

        user.sanitize();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "login": "alice",
                "stage_name": "Alice A",
                "music_auth_cookie": " ",
            })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_valid_users_pass_validation(
            login in "[a-zA-Z0-9]{1,20}",
            password in "[ -~]{6,100}",
            stage_name in "[a-zA-Z0-9 ]{1,60}",
        ) {
            prop_assert!(User::new(login, password, stage_name).validate().is_ok());
        }

        #[test]
        fn prop_short_passwords_fail(password in "[ -~]{1,5}") {
            prop_assert!(User::new("alice", password, "Alice").validate().is_err());
        }
    }
}
