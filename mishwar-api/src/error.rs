use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use mishwar_domain::repository::{TokenStoreError, TripStoreError};
use mishwar_domain::validation::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    Unauthenticated(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Validation(ValidationErrors),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AppError::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AppError::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "message": "Validation failed",
                    "errors": errors.issues,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<TripStoreError> for AppError {
    fn from(err: TripStoreError) -> Self {
        match err {
            TripStoreError::NotFound => AppError::not_found("Trip not found"),
            TripStoreError::NotOwner => {
                AppError::forbidden("You are not allowed to modify this trip")
            }
            TripStoreError::InvalidCursor => AppError::bad_request("Invalid cursor provided"),
            TripStoreError::Seats(e) => AppError::BadRequest(e.to_string()),
            TripStoreError::Backend(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<TokenStoreError> for AppError {
    fn from(err: TokenStoreError) -> Self {
        match err {
            TokenStoreError::Backend(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}
