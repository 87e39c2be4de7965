use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::auth::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error body returned by every handler: `{"message": ..., "detail": ...}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, message: message.into(), detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { message: &self.message, detail: self.detail.as_deref() };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::Model(models::errors::ModelError::Validation(msg)) => Self::bad_request(msg),
            other => {
                error!(err = %other, "store operation failed");
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, e.to_string(), None),
            AuthError::Forbidden => Self::new(StatusCode::FORBIDDEN, e.to_string(), None),
            AuthError::Validation(msg) => Self::bad_request(msg),
            AuthError::TokenError(ref msg) => {
                error!(code = e.code(), err = %msg, "token issuance failed");
                Self::internal(msg.clone())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("store check failed: {0}")]
    Store(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
