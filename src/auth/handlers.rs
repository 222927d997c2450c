//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{CheckCookieRequest, LoginRequest, UpdateCookieRequest};
use crate::core::error::{AuthError, Result};
use crate::db::models::{User, DEFAULT_AUTH_COOKIE};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// Single message for unknown logins and wrong passwords
pub const INCORRECT_CREDENTIALS: &str = "incorrect login or password";

/// Handler for POST /sessions - Log in and start a session
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;
    tracing::info!(login = %req.login, "Login attempt");

    let user = match state.users.find_by_login(&req.login).await {
        Ok(user) => Some(user),
        Err(AuthError::RecordNotFound) => None,
        Err(e) => return Err(e),
    };

    // unknown login and wrong password end in the same response after the
    // same amount of bcrypt work
    let hasher = state.hasher;
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || match user {
        Some(user) => user.compare_password(&password).then_some(user),
        None => {
            let _ = hasher.hash(&password);
            None
        }
    })
    .await
    .map_err(|e| AuthError::HashError(format!("Verification task panicked: {}", e)))?;

    let Some(user) = verified else {
        tracing::warn!(login = %req.login, "Login failed");
        return Err(AuthError::Unauthorized(INCORRECT_CREDENTIALS.to_string()));
    };

    let mut session = state.sessions.get(&headers)?;
    session.set_user_id(user.id)?;

    let mut response = Json(user.id).into_response();
    state.sessions.save(response.headers_mut(), &session)?;

    tracing::info!(user_id = user.id, login = %user.login, "Login successful");
    Ok(response)
}

/// Handler for POST /updateCookie - Overwrite a user's auth cookie
pub async fn update_cookie(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateCookieRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;

    match state.users.update_cookie(&req.login, &req.auth_cookie).await {
        Ok(()) => {
            tracing::info!(login = %req.login, "Auth cookie updated");
            Ok(StatusCode::OK.into_response())
        }
        Err(e) => Ok(e.into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)),
    }
}

/// Handler for POST /checkCookie - Resolve an auth cookie to its user
pub async fn check_cookie(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CheckCookieRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;

    // every new user starts with this placeholder, so it never identifies
    // anyone; any other value, blank or not, is an exact match
    if req.auth_cookie == DEFAULT_AUTH_COOKIE {
        return Ok(AuthError::RecordNotFound.into_response_with_status(StatusCode::UNAUTHORIZED));
    }

    match state.users.find_by_cookie(&req.auth_cookie).await {
        Ok(user) => Ok(Json(user).into_response()),
        Err(e @ AuthError::RecordNotFound) => {
            Ok(e.into_response_with_status(StatusCode::UNAUTHORIZED))
        }
        Err(e) => Err(e),
    }
}

/// Handler for GET /private/whoami - The user behind the current session
pub async fn whoami(AuthUser(user): AuthUser) -> Json<User> {
    tracing::debug!(user_id = user.id, "Who am I");
    Json(user)
}
