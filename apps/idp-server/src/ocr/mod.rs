//! OCR Module
//!
//! Converts uploaded documents (PDF or raster image) into plain text.
//!
//! Supports multiple backends:
//! - Tesseract (local binary, default)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idp_server::ocr::{TesseractRecognizer, TextRecognizer};
//!
//! let recognizer = TesseractRecognizer::detect("eng", 2.0)?;
//! let text = recognizer.extract_text(&bytes, "invoice.pdf").await?;
//! ```

mod provider;
mod raster;
mod types;

pub use provider::{OllamaRecognizer, TesseractRecognizer, TextRecognizer};
pub use raster::{detect_kind, prepare_page, SourceKind};
pub use types::{OcrError, RecognizerKind};

#[cfg(test)]
pub(crate) use provider::MockRecognizer;
