//! Authentication middleware

use crate::api::handlers::AppState;
use crate::core::error::{AuthError, Result};
use crate::db::models::User;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Message returned whenever a protected route is hit without a usable session
pub const NOT_AUTHENTICATED: &str = "not authenticated";

/// The user resolved from the session, stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Authentication middleware
///
/// Resolves the session cookie to a user and hands it to the next handler
/// through the request extensions. Requests without a session `user_id`, or
/// whose user no longer exists, are rejected with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match state.sessions.get(request.headers()) {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    let Some(user_id) = session.user_id() else {
        return AuthError::Unauthorized(NOT_AUTHENTICATED.to_string()).into_response();
    };

    let user = match state.users.find_by_id(user_id).await {
        Ok(user) => user,
        Err(AuthError::RecordNotFound) => {
            tracing::warn!(user_id, "Session refers to a missing user");
            return AuthError::Unauthorized(NOT_AUTHENTICATED.to_string()).into_response();
        }
        Err(e) => return e.into_response(),
    };

    tracing::debug!(user_id = user.id, "Request authenticated");
    request.extensions_mut().insert(AuthUser(user));

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthorized(NOT_AUTHENTICATED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::auth::session::{CookieSessionStore, Session, SessionStore, SESSION_NAME};
    use crate::db::memory::MemoryUserRepository;
    use crate::db::repository::UserRepository;
    use axum::{
        body::Body,
        http::{header, HeaderMap, HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
        Json, Router,
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    async fn echo_login(AuthUser(user): AuthUser) -> Json<String> {
        Json(user.login)
    }

    async fn setup() -> (AppState, Router) {
        let state = AppState {
            users: Arc::new(MemoryUserRepository::new(PasswordHasher::minimum())),
            sessions: Arc::new(CookieSessionStore::new(b"middleware-key".to_vec())),
            hasher: PasswordHasher::minimum(),
        };
        let app = Router::new()
            .route("/protected", get(echo_login))
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
            .with_state(state.clone());
        (state, app)
    }

    fn session_cookie(state: &AppState, user_id: Option<i64>) -> HeaderValue {
        let mut session = Session::new();
        if let Some(id) = user_id {
            session.set_user_id(id).unwrap();
        }
        let mut headers = HeaderMap::new();
        state.sessions.save(&mut headers, &session).unwrap();

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        HeaderValue::from_str(set_cookie.split(';').next().unwrap()).unwrap()
    }

    async fn call(app: Router, cookie: Option<HeaderValue>) -> (StatusCode, String) {
        let mut request = Request::builder().uri("/protected");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_no_cookie_is_unauthorized() {
        let (_state, app) = setup().await;
        let (status, body) = call(app, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"not authenticated"}"#);
    }

    #[tokio::test]
    async fn test_session_without_user_id_is_unauthorized() {
        let (state, app) = setup().await;
        let cookie = session_cookie(&state, None);
        let (status, _) = call(app, Some(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_for_missing_user_is_unauthorized() {
        let (state, app) = setup().await;
        let cookie = session_cookie(&state, Some(99));
        let (status, _) = call(app, Some(cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forged_cookie_is_unauthorized() {
        let (state, app) = setup().await;
        state.users.create(User::new("alice", "secret1", "Alice")).await.unwrap();

        let forged = HeaderValue::from_str(&format!("{}=eyJ1c2VyX2lkIjoxfQ.AAAA", SESSION_NAME)).unwrap();
        let (status, _) = call(app, Some(forged)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_session_reaches_handler() {
        let (state, app) = setup().await;
        let user = state.users.create(User::new("alice", "secret1", "Alice")).await.unwrap();

        let cookie = session_cookie(&state, Some(user.id));
        let (status, body) = call(app, Some(cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#""alice""#);
    }
}
