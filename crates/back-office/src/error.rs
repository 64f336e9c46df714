//! Error types for the back-office web interface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur in the back-office interface.
#[derive(Debug, Error)]
pub enum AppError {
    /// No identity headers, or a session the auth proxy did not vouch for.
    #[error("Sessão inválida ou expirada")]
    Unauthorized,

    /// Identity was present but the profile could not be provisioned;
    /// the caller gets a degraded view, not a crash.
    #[error("Não foi possível carregar seu perfil de acesso.")]
    ProvisioningFailed,

    /// Review workflow error.
    #[error("{0}")]
    Review(#[from] review::ReviewError),

    /// Database error.
    #[error("{0}")]
    Database(#[from] database::DatabaseError),

    /// Malformed request input.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::ProvisioningFailed => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Review(err) => review_status(err),
            AppError::Database(err) => database_status(err),
        }
    }
}

fn review_status(err: &review::ReviewError) -> StatusCode {
    match err {
        review::ReviewError::Forbidden(_) => StatusCode::FORBIDDEN,
        review::ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
        review::ReviewError::ClassificationGap => StatusCode::CONFLICT,
        review::ReviewError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        review::ReviewError::Database(err) => database_status(err),
    }
}

fn database_status(err: &database::DatabaseError) -> StatusCode {
    match err {
        database::DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        database::DatabaseError::AlreadyExists { .. }
        | database::DatabaseError::InvalidState { .. } => StatusCode::CONFLICT,
        database::DatabaseError::Constraint(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }

        // The remote message passes through verbatim; operators rely on it.
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, AppError>;
