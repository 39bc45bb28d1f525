//! Error types for the extraction pipeline
//!
//! Every failure a request can hit is one of the closed variants below. The
//! HTTP status is picked by a single exhaustive match in
//! [`ExtractionError::status_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::extraction::{ALLOWED_CONTENT_TYPES, MAX_FILE_SIZE};

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Generic message returned for unclassified failures
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Caller-fixable input problems
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("Invalid file type. Allowed: {}", ALLOWED_CONTENT_TYPES.join(", "))]
    UnsupportedMediaType { content_type: String },

    #[error("File too large. Max size: {}MB", MAX_FILE_SIZE / (1024 * 1024))]
    PayloadTooLarge { size: u64 },

    #[error("Invalid JSON in schema_config")]
    MalformedSchema,

    #[error("{0}")]
    InvalidFileContent(String),

    #[error("{0}")]
    MalformedUpload(String),
}

impl InvalidInput {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. }
            | Self::MalformedSchema
            | Self::InvalidFileContent(_)
            | Self::MalformedUpload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Classified extraction failure
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("OCR failed: {0}")]
    RecognitionFailed(String),

    #[error("LLM failed: {0}")]
    ParsingFailed(String),

    /// Carries diagnostic detail for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`ExtractionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    RecognitionFailed,
    ParsingFailed,
    Internal,
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::RecognitionFailed(_) => ErrorKind::RecognitionFailed,
            Self::ParsingFailed(_) => ErrorKind::ParsingFailed,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(invalid) => invalid.status_code(),
            Self::RecognitionFailed(_) | Self::ParsingFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to the caller
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_DETAIL.to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::InvalidInput(invalid) => {
                tracing::warn!(status = status.as_u16(), "Rejected extraction request: {}", invalid)
            }
            other => tracing::error!(status = status.as_u16(), kind = ?other.kind(), "{}", other),
        }

        (status, Json(ErrorResponse::new(self.detail()))).into_response()
    }
}
