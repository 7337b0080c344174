//! HTTP error responses.

use crate::error::ConvertError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Error returned by a handler: a status, a stable machine-readable code and
/// a human-readable message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: message.into(),
        }
    }
}

impl From<ConvertError> for ApiError {
    fn from(err: ConvertError) -> Self {
        let code = match &err {
            ConvertError::UnsupportedFormat { .. } => "unsupported_format",
            ConvertError::UnsupportedInput { .. } => "unsupported_input",
            ConvertError::NotADocument { .. } => "not_a_document",
            ConvertError::CorruptDocument { .. } => "corrupt_document",
            ConvertError::NotFound { .. } => "not_found",
            ConvertError::CaptionUnavailable { .. } => "caption_unavailable",
            ConvertError::PdfiumBindingFailed(_) => "pdfium_unavailable",
            ConvertError::Database(_) => "database",
            _ => "internal",
        };
        let status = match &err {
            ConvertError::NotFound { .. } => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            ConvertError::CaptionUnavailable { .. } | ConvertError::PdfiumBindingFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "{}", self.message);
        } else {
            tracing::debug!(code = self.code, "{}", self.message);
        }
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
