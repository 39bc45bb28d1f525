//! Extraction Module
//!
//! Sequences one upload through the pipeline:
//! 1. Content-type and size gates
//! 2. Schema resolution (caller JSON or the built-in invoice schema)
//! 3. Text recognition
//! 4. Empty-text short-circuit
//! 5. Structured parsing
//!
//! Every failure leaves as a classified [`ExtractionError`](crate::error::ExtractionError).

mod service;
mod types;

pub use service::Extractor;
pub use types::{ExtractionRequest, ExtractionResponse, ExtractionResult, ExtractionStatus};

/// Content types accepted for upload
pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/png", "image/webp"];

/// Upload ceiling in bytes (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Message returned when recognition yields no text
pub const NO_TEXT_MESSAGE: &str = "No text detected in document";
