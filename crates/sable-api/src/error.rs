use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use sable_client::ClientError;
use sable_types::api::ErrorBody;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Route handler failure. Rendered as `{"error": "..."}` with the matching status.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal() -> Self {
        Self::Internal(INTERNAL_MESSAGE.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Maps backend failures onto route statuses. Unrecognised failures are
/// logged and hidden behind a generic 500.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Backend { message } => classify_backend_message(message),
            ClientError::Http { status, message } => match status {
                StatusCode::BAD_REQUEST => Self::BadRequest(message),
                StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
                StatusCode::FORBIDDEN => Self::Forbidden(message),
                StatusCode::NOT_FOUND => Self::NotFound(message),
                _ => {
                    error!("backend returned {}: {}", status, message);
                    Self::internal()
                }
            },
            other => {
                error!("backend call failed: {}", other);
                Self::internal()
            }
        }
    }
}

fn classify_backend_message(message: String) -> ApiError {
    let lower = message.to_lowercase();
    if lower.contains("not found") {
        ApiError::NotFound(message)
    } else if lower.contains("not authenticated") || lower.contains("unauthorized") || lower.contains("unauthenticated") {
        ApiError::Unauthorized(message)
    } else if lower.contains("forbidden") || lower.contains("not an admin") || lower.contains("permission") {
        ApiError::Forbidden(message)
    } else {
        error!("backend function error: {}", message);
        ApiError::internal()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
