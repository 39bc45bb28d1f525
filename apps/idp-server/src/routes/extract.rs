//! Document extraction endpoint
//!
//! `POST /api/v1/extract` takes a multipart body with a `file` part and an
//! optional `schema_config` text part.

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};

use crate::error::{ExtractionError, InvalidInput};
use crate::extraction::{ExtractionRequest, ExtractionResponse, MAX_FILE_SIZE};
use crate::state::AppState;

const DEFAULT_FILENAME: &str = "unknown";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// File part read under the size cap
struct UploadedFile {
    bytes: Bytes,
    total_size: u64,
    filename: String,
    content_type: String,
}

/// Run the extraction pipeline on an uploaded document
pub async fn extract_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResponse>, ExtractionError> {
    let mut multipart = multipart.map_err(|e| InvalidInput::MalformedUpload(e.body_text()))?;

    let mut file: Option<UploadedFile> = None;
    let mut schema_config: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if file.is_none() => file = Some(read_capped(field).await?),
            "schema_config" => schema_config = Some(field.text().await.map_err(upload_error)?),
            other => tracing::debug!(field = other, "Ignoring multipart field"),
        }
    }

    let file = file.ok_or_else(|| {
        tracing::warn!("No file field found in multipart upload");
        InvalidInput::MalformedUpload("No file provided. Use field name 'file'".to_string())
    })?;

    tracing::debug!(
        filename = %file.filename,
        content_type = %file.content_type,
        buffered = file.bytes.len(),
        size = file.total_size,
        "Received upload"
    );

    let mut request = ExtractionRequest::new(file.bytes, file.filename, file.content_type)
        .with_file_size(file.total_size);
    request.schema_config = schema_config;

    let result = state.extractor().extract(request).await?;
    Ok(Json(ExtractionResponse::from(result)))
}

/// Buffer at most `MAX_FILE_SIZE + 1` bytes; count and discard the rest
async fn read_capped(mut field: Field<'_>) -> Result<UploadedFile, ExtractionError> {
    let filename = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILENAME)
        .to_string();
    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let cap = MAX_FILE_SIZE as usize + 1;
    let mut buffer: Vec<u8> = Vec::new();
    let mut total_size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(upload_error)? {
        total_size += chunk.len() as u64;
        let room = cap.saturating_sub(buffer.len());
        buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    Ok(UploadedFile {
        bytes: Bytes::from(buffer),
        total_size,
        filename,
        content_type,
    })
}

fn upload_error(err: MultipartError) -> ExtractionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        InvalidInput::PayloadTooLarge {
            size: MAX_FILE_SIZE + 1,
        }
        .into()
    } else {
        InvalidInput::MalformedUpload(format!("Failed to read upload: {}", err.body_text())).into()
    }
}
