//! Error type system for the authentication service
//!
//! This module provides:
//! - A single error enum shared by the store, session and HTTP layers
//! - HTTP status code mapping
//! - `{"error": "..."}` response bodies that never expose internal detail

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned to clients for every 5xx failure
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Main error type for the authentication service
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Request errors
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("login already exists")]
    Conflict,

    #[error("record not found")]
    RecordNotFound,

    #[error("{0}")]
    Unauthorized(String),

    // Internal failures
    #[error("Password hashing failed: {0}")]
    HashError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,

            AuthError::ValidationError(_) | AuthError::Conflict => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            AuthError::RecordNotFound => StatusCode::NOT_FOUND,

            AuthError::HashError(_)
            | AuthError::SessionError(_)
            | AuthError::DatabaseError(_)
            | AuthError::StoreError(_)
            | AuthError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name used in log records
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest(_) => "InvalidRequest",
            AuthError::ValidationError(_) => "ValidationError",
            AuthError::Conflict => "Conflict",
            AuthError::RecordNotFound => "RecordNotFound",
            AuthError::Unauthorized(_) => "Unauthorized",
            AuthError::HashError(_) => "HashError",
            AuthError::SessionError(_) => "SessionError",
            AuthError::DatabaseError(_) => "DatabaseError",
            AuthError::StoreError(_) => "StoreError",
            AuthError::IoError(_) => "IoError",
        }
    }

    /// Whether this error describes a server-side failure
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to hand back to a client
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Build a response with an explicit status, keeping the public message.
    ///
    /// Handlers use this where an endpoint maps a store failure to a status
    /// other than the default one (e.g. not-found reported as 401).
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let body = ErrorResponse::new(self.public_message());

        if status.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                status_code = %status,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                status_code = %status,
                "Request rejected: {}",
                self
            );
        }

        (status, Json(body)).into_response()
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.into_response_with_status(status)
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AuthError {
    fn from(rejection: PathRejection) -> Self {
        AuthError::InvalidRequest(rejection.body_text())
    }
}

/// Result type alias for operations that can fail with AuthError
pub type Result<T> = std::result::Result<T, AuthError>;
