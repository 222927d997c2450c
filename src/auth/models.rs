//! Authentication request models
//!
//! Missing fields decode as empty strings so they fail validation instead
//! of being rejected as malformed JSON.

use serde::Deserialize;

/// Registration request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub login: String,
    pub password: String,
    pub stage_name: String,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Auth cookie update request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCookieRequest {
    pub login: String,
    pub auth_cookie: String,
}

/// Auth cookie lookup request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckCookieRequest {
    pub auth_cookie: String,
}
