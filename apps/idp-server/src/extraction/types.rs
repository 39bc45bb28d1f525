//! Extraction request and result types

use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::schema::TargetSchema;

/// A single upload handed to the extractor
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Buffered file content
    pub file_bytes: Bytes,
    /// Total bytes received; larger than `file_bytes` when the upload was capped
    pub file_size: u64,
    pub filename: String,
    pub content_type: String,
    /// Raw JSON text of the caller's schema, if any
    pub schema_config: Option<String>,
}

impl ExtractionRequest {
    pub fn new(
        file_bytes: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let file_bytes = file_bytes.into();
        Self {
            file_size: file_bytes.len() as u64,
            file_bytes,
            filename: filename.into(),
            content_type: content_type.into(),
            schema_config: None,
        }
    }

    pub fn with_schema_config(mut self, schema_config: impl Into<String>) -> Self {
        self.schema_config = Some(schema_config.into());
        self
    }

    /// Record the true upload size when only a prefix was buffered
    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }
}

/// Outcome of a pipeline run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success {
        filename: String,
        schema_used: TargetSchema,
        extracted_data: Value,
        raw_text: String,
    },
    NoTextFound {
        filename: String,
        message: String,
    },
}

impl ExtractionResult {
    pub fn filename(&self) -> &str {
        match self {
            Self::Success { filename, .. } | Self::NoTextFound { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Success,
    Failed,
}

/// JSON envelope returned by `POST /api/v1/extract`
#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub status: ExtractionStatus,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_schema_used: Option<TargetSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<Value>,
    pub raw_text: Option<String>,
}

impl From<ExtractionResult> for ExtractionResponse {
    fn from(result: ExtractionResult) -> Self {
        match result {
            ExtractionResult::Success {
                filename,
                schema_used,
                extracted_data,
                raw_text,
            } => Self {
                status: ExtractionStatus::Success,
                filename,
                extraction_schema_used: Some(schema_used),
                message: None,
                data: Some(extracted_data),
                raw_text: Some(raw_text),
            },
            ExtractionResult::NoTextFound { filename, message } => Self {
                status: ExtractionStatus::Failed,
                filename,
                extraction_schema_used: None,
                message: Some(message),
                data: None,
                raw_text: None,
            },
        }
    }
}
