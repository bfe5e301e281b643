//! API error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use grc_common::GrcError;

/// Error body returned to the console
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Wrapper turning domain errors into HTTP responses
#[derive(Debug)]
pub struct ApiError(pub GrcError);

impl From<GrcError> for ApiError {
    fn from(err: GrcError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            GrcError::NotFound(_) | GrcError::UnknownControl(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            GrcError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
            GrcError::MissingField(_)
            | GrcError::InvalidRating(_)
            | GrcError::InvalidValue { .. }
            | GrcError::InvalidDateRange(_)
            | GrcError::ControlNotApplicable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed")
            }
        };
        tracing::warn!(code, error = %self.0, "request rejected");
        let body = ErrorBody {
            code: code.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
