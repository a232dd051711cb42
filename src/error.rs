use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::dto::FieldError;
use crate::auth::repo::StoreError;

pub const EMAIL_TAKEN_MSG: &str = "Email already exists";
pub const BAD_CREDENTIALS_MSG: &str = "Please try to login with correct details";

/// Every failure a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("email already registered")]
    EmailTaken,
    /// Unknown email and wrong password both map here.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("malformed request body")]
    MalformedBody,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::EmailTaken,
            StoreError::Backend(e) => ApiError::Internal(e.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            ApiError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                vec![FieldError::field("email", EMAIL_TAKEN_MSG)],
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                vec![FieldError::general(BAD_CREDENTIALS_MSG)],
            ),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, vec![FieldError::general(msg)])
            }
            ApiError::MalformedBody => (
                StatusCode::BAD_REQUEST,
                vec![FieldError::general("Malformed request body")],
            ),
            ApiError::Internal(e) => {
                error!(error = ?e, "internal error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };
        (status, Json(json!({ "errors": errors }))).into_response()
    }
}
