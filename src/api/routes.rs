//! API routes

use crate::api::handlers::{create_user, get_user_by_id, AppState};
use crate::auth::handlers::{check_cookie, create_session, update_cookie, whoami};
use crate::auth::middleware::authenticate;
use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Build the API routes
pub fn build_api_routes(state: AppState, cors: CorsLayer) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user_by_id))
        .route("/sessions", post(create_session))
        .route("/updateCookie", post(update_cookie))
        .route("/checkCookie", post(check_cookie))
        .layer(cors);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/private/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// CORS layer for the public routes, pinned to a single credentialed origin.
///
/// The layer answers every `OPTIONS` request itself with 200 and an empty body.
pub fn build_cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| anyhow::anyhow!("Invalid allowed origin '{}': {}", allowed_origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
            CONTENT_TYPE,
        ]))
}
