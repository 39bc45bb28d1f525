//! Extraction orchestrator

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::types::{ExtractionRequest, ExtractionResult};
use super::{ALLOWED_CONTENT_TYPES, MAX_FILE_SIZE, NO_TEXT_MESSAGE};
use crate::error::{ExtractionError, InvalidInput, Result};
use crate::llm::StructuredParser;
use crate::ocr::{OcrError, TextRecognizer};
use crate::schema::TargetSchema;

/// Runs the OCR + LLM pipeline for one upload at a time.
///
/// Holds only shared handles, so clones are cheap and may run concurrently.
#[derive(Clone)]
pub struct Extractor {
    recognizer: Arc<dyn TextRecognizer>,
    parser: Arc<dyn StructuredParser>,
}

impl Extractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, parser: Arc<dyn StructuredParser>) -> Self {
        Self { recognizer, parser }
    }

    pub fn recognizer(&self) -> &dyn TextRecognizer {
        self.recognizer.as_ref()
    }

    pub fn parser(&self) -> &dyn StructuredParser {
        self.parser.as_ref()
    }

    /// Run the pipeline.
    ///
    /// Gates run in a fixed order: content type, size, schema. The recognizer
    /// is only reached once all three pass, and the parser only when
    /// recognition produced non-blank text.
    #[instrument(skip_all, fields(filename = %request.filename))]
    pub async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult> {
        let content_type = normalize_content_type(&request.content_type);
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(InvalidInput::UnsupportedMediaType { content_type }.into());
        }

        if request.file_size > MAX_FILE_SIZE {
            return Err(InvalidInput::PayloadTooLarge {
                size: request.file_size,
            }
            .into());
        }

        let schema = TargetSchema::resolve(request.schema_config.as_deref())?;

        info!(
            content_type = %content_type,
            size = request.file_size,
            fields = schema.len(),
            "Processing document"
        );

        let raw_text = self
            .recognizer
            .extract_text(&request.file_bytes, &request.filename)
            .await
            .map_err(classify_ocr_error)?;

        debug!(chars = raw_text.len(), "Text recognition finished");

        if raw_text.trim().is_empty() {
            warn!("No text detected in document");
            return Ok(ExtractionResult::NoTextFound {
                filename: request.filename,
                message: NO_TEXT_MESSAGE.to_string(),
            });
        }

        let extracted_data = self
            .parser
            .parse_document(&raw_text, &schema)
            .await
            .map_err(|e| ExtractionError::ParsingFailed(e.to_string()))?;

        info!("Extraction completed");

        Ok(ExtractionResult::Success {
            filename: request.filename,
            schema_used: schema,
            extracted_data,
            raw_text,
        })
    }
}

/// Strip parameters (`; charset=...`) and lower-case
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn classify_ocr_error(err: OcrError) -> ExtractionError {
    match err {
        OcrError::InvalidFile(message) => InvalidInput::InvalidFileContent(message).into(),
        OcrError::TaskFailed(message) => ExtractionError::Internal(message),
        other => ExtractionError::RecognitionFailed(other.to_string()),
    }
}
