//! Signed cookie sessions
//!
//! A session is a small JSON map carried entirely in one cookie, so nothing
//! is stored server-side. The payload is base64url encoded and signed with
//! the `cookie` crate's signed jar; it also embeds its own `expires_at` so a
//! replayed cookie stops working after the session lifetime.

use crate::core::error::{AuthError, Result};
use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, CookieJar, Key, SameSite};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha512};

/// Name of the session cookie
pub const SESSION_NAME: &str = "music_auth_cookie";

/// Session lifetime in seconds
pub const SESSION_MAX_AGE: i64 = 86_400;

/// Session key holding the authenticated user's id
pub const USER_ID_KEY: &str = "user_id";

/// Values carried by one session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    values: Map<String, Value>,
    is_new: bool,
}

impl Session {
    /// An empty session that was not read from a cookie
    pub fn new() -> Self {
        Self {
            values: Map::new(),
            is_new: true,
        }
    }

    /// Whether the session was freshly created rather than decoded from a cookie
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| AuthError::SessionError(format!("Failed to encode value: {}", e)))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get(USER_ID_KEY)
    }

    pub fn set_user_id(&mut self, user_id: i64) -> Result<()> {
        self.insert(USER_ID_KEY, user_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads sessions from requests and writes them to responses
pub trait SessionStore: Send + Sync {
    /// Resolve the session carried by the request headers.
    ///
    /// A missing, tampered or expired cookie yields a fresh empty session.
    fn get(&self, headers: &HeaderMap) -> Result<Session>;

    /// Sign the session and append it as a `Set-Cookie` header
    fn save(&self, headers: &mut HeaderMap, session: &Session) -> Result<()>;
}

/// Attributes written with every session cookie
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub path: String,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: SESSION_MAX_AGE,
            secure: true,
            http_only: true,
            // the client app is served from another origin
            same_site: SameSite::None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SessionPayload {
    values: Map<String, Value>,
    expires_at: i64,
}

/// Session store keeping the whole session in a signed cookie
pub struct CookieSessionStore {
    name: String,
    key: Key,
    options: CookieOptions,
}

impl CookieSessionStore {
    /// Store signing with a key derived from the configured secret.
    ///
    /// The secret is stretched to the 64 bytes `Key` requires with SHA-512,
    /// so short secrets are accepted.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let digest = Sha512::digest(secret.as_ref());
        Self::with_key(Key::from(digest.as_slice()))
    }

    /// Store signing with a random key; sessions die with the process
    pub fn with_random_key() -> Self {
        Self::with_key(Key::generate())
    }

    fn with_key(key: Key) -> Self {
        Self {
            name: SESSION_NAME.to_string(),
            key,
            options: CookieOptions::default(),
        }
    }

    /// Signed session cookie that expires `max_age` seconds after `issued_at`
    fn signed_cookie(&self, session: &Session, issued_at: i64) -> Result<Cookie<'static>> {
        let expires_at = issued_at + self.options.max_age;
        let payload = SessionPayload {
            values: session.values.clone(),
            expires_at,
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|e| AuthError::SessionError(format!("Failed to encode session: {}", e)))?;
        let expires = OffsetDateTime::from_unix_timestamp(expires_at)
            .map_err(|e| AuthError::SessionError(format!("Invalid session expiry: {}", e)))?;

        let cookie = Cookie::build((self.name.clone(), URL_SAFE_NO_PAD.encode(json)))
            .path(self.options.path.clone())
            .max_age(Duration::seconds(self.options.max_age))
            .expires(expires)
            .secure(self.options.secure)
            .http_only(self.options.http_only)
            .same_site(self.options.same_site);

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(&self.name)
            .cloned()
            .ok_or_else(|| AuthError::SessionError("Signed cookie missing from jar".to_string()))
    }

    /// Verify and decode the session cookie, or `None` when it is missing,
    /// tampered, malformed or expired
    fn decode(&self, headers: &HeaderMap, now: i64) -> Option<Session> {
        let jar = request_jar(headers);
        let Some(cookie) = jar.signed(&self.key).get(&self.name) else {
            if jar.get(&self.name).is_some() {
                tracing::debug!("Rejected session cookie with invalid signature");
            }
            return None;
        };

        let payload = URL_SAFE_NO_PAD
            .decode(cookie.value())
            .ok()
            .and_then(|json| serde_json::from_slice::<SessionPayload>(&json).ok())?;

        if payload.expires_at <= now {
            tracing::debug!("Rejected expired session cookie");
            return None;
        }

        Some(Session {
            values: payload.values,
            is_new: false,
        })
    }
}

/// Collect the cookies of every `Cookie` request header into a jar
fn request_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
    {
        for cookie in Cookie::split_parse(value.to_string()).flatten() {
            jar.add_original(cookie);
        }
    }
    jar
}

impl SessionStore for CookieSessionStore {
    fn get(&self, headers: &HeaderMap) -> Result<Session> {
        let now = chrono::Utc::now().timestamp();
        Ok(self.decode(headers, now).unwrap_or_default())
    }

    fn save(&self, headers: &mut HeaderMap, session: &Session) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let cookie = self.signed_cookie(session, now)?;

        let value = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| AuthError::SessionError(format!("Invalid cookie header: {}", e)))?;
        headers.append(header::SET_COOKIE, value);

        Ok(())
    }
}
