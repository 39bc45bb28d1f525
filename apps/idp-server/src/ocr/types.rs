//! OCR Types

use serde::{Deserialize, Serialize};

/// OCR backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    /// Tesseract OCR (local binary)
    #[default]
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

impl std::str::FromStr for RecognizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown OCR provider '{}'", other)),
        }
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The bytes cannot be decoded as the declared document type
    #[error("{0}")]
    InvalidFile(String),

    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking worker panicked or was cancelled
    #[error("OCR worker failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for OcrError {
    fn from(err: tokio::task::JoinError) -> Self {
        OcrError::TaskFailed(err.to_string())
    }
}
