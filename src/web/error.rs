use crate::utils::error::{ErrorCategory, TimetableError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// JSON error answered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    pub fn generation_running() -> Self {
        Self::Conflict("A generation is already in progress".to_string())
    }
}

impl From<TimetableError> for ApiError {
    fn from(err: TimetableError) -> Self {
        match &err {
            TimetableError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::NotFound(err.to_string())
            }
            _ => match err.category() {
                ErrorCategory::Input | ErrorCategory::Configuration => Self::BadRequest(err.to_string()),
                ErrorCategory::Processing | ErrorCategory::System => {
                    tracing::error!("❌ {} ({:?})", err, err.severity());
                    Self::Internal(err.to_string())
                }
            },
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::BadRequest(format!("Invalid upload: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
