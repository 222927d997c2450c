use crate::auth::models::CreateUserRequest;
use crate::core::error::{AuthError, Result};
use crate::db::models::User;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use super::AppState;

/// Handler for POST /users - Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;

    let mut user = state
        .users
        .create(User::new(req.login, req.password, req.stage_name))
        .await?;
    user.sanitize();

    tracing::info!(user_id = user.id, login = %user.login, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for GET /users/:id - Fetch a user by id
///
/// An unknown id answers 204 with an empty body rather than 404.
pub async fn get_user_by_id(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Response> {
    let Path(id) = id?;

    match state.users.find_by_id(id).await {
        Ok(user) => Ok(Json(user).into_response()),
        Err(AuthError::RecordNotFound) => {
            tracing::debug!(user_id = id, "User not found");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => Err(e),
    }
}
