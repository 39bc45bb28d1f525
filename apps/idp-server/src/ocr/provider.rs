//! OCR Providers
//!
//! Defines the recognizer trait and the backends behind it.

use std::time::Duration;

use async_trait::async_trait;

use super::raster::prepare_page;
use super::types::{OcrError, RecognizerKind};

/// Text recognizer trait
///
/// Implementations hold only immutable configuration, so one instance is
/// shared by every request.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Get the backend type
    fn kind(&self) -> RecognizerKind;

    /// Check if the backend can currently serve requests
    async fn is_available(&self) -> bool;

    /// Recognize the text of a PDF or raster image.
    ///
    /// Returns `OcrError::InvalidFile` when the bytes cannot be decoded and
    /// `Ok("")` when the document decodes but holds no text.
    async fn extract_text(&self, data: &[u8], filename: &str) -> Result<String, OcrError>;
}

/// Run page preparation on the blocking pool
async fn prepare_page_blocking(
    data: &[u8],
    filename: &str,
    pdf_scale: f32,
) -> Result<Vec<u8>, OcrError> {
    let data = data.to_vec();
    let filename = filename.to_string();
    tokio::task::spawn_blocking(move || prepare_page(&data, &filename, pdf_scale)).await?
}

/// Trim recognized lines and drop blank ones
pub(crate) fn collect_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tesseract OCR provider (command-line binary)
pub struct TesseractRecognizer {
    language: String,
    pdf_scale: f32,
}

impl TesseractRecognizer {
    pub fn new(language: &str, pdf_scale: f32) -> Self {
        Self {
            language: language.to_string(),
            pdf_scale,
        }
    }

    /// Create the provider after checking that the binary runs
    pub fn detect(language: &str, pdf_scale: f32) -> Result<Self, OcrError> {
        let output = std::process::Command::new("tesseract")
            .arg("--version")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::ProviderNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ),
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            return Err(OcrError::ProviderNotAvailable(
                "tesseract --version failed".to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        tracing::info!(
            version = version.lines().next().unwrap_or("unknown"),
            language,
            "Tesseract detected"
        );

        Ok(Self::new(language, pdf_scale))
    }

    async fn run_tesseract(&self, page_png: &[u8]) -> Result<String, OcrError> {
        let temp_dir = tempfile::TempDir::new()?;
        let input_path = temp_dir.path().join("page.png");
        tokio::fs::write(&input_path, page_png).await?;

        let output = tokio::process::Command::new("tesseract")
            .arg(&input_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::ProviderNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ),
                _ => OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Tesseract
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new("tesseract")
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn extract_text(&self, data: &[u8], filename: &str) -> Result<String, OcrError> {
        let page = prepare_page_blocking(data, filename, self.pdf_scale).await?;

        tracing::debug!(filename, page_bytes = page.len(), "Running Tesseract");
        let text = collect_lines(&self.run_tesseract(&page).await?);

        if text.is_empty() {
            tracing::warn!(filename, "No text detected in document");
        } else {
            tracing::info!(filename, lines = text.lines().count(), "Extracted text");
        }

        Ok(text)
    }
}

/// Ollama vision model provider
pub struct OllamaRecognizer {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
    pdf_scale: f32,
}

impl OllamaRecognizer {
    pub fn new(base_url: &str, model: &str, pdf_scale: f32) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| OcrError::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            pdf_scale,
        })
    }
}

#[async_trait]
impl TextRecognizer for OllamaRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn extract_text(&self, data: &[u8], filename: &str) -> Result<String, OcrError> {
        use base64::Engine;

        let page = prepare_page_blocking(data, filename, self.pdf_scale).await?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(&page);

        let request = serde_json::json!({
            "model": self.model,
            "prompt": "Extract all text from this image exactly as written. \
                       Return only the extracted text, nothing else. \
                       If the image contains no text, return an empty response.",
            "images": [image_base64],
            "stream": false,
            "options": { "temperature": 0 }
        });

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = collect_lines(result["response"].as_str().unwrap_or(""));
        tracing::info!(filename, chars = text.len(), model = %self.model, "Ollama transcription complete");

        Ok(text)
    }
}

/// Mock recognizer for testing
#[cfg(test)]
pub struct MockRecognizer {
    pub response: Result<String, fn() -> OcrError>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: Default::default(),
        }
    }

    pub fn failing(error: fn() -> OcrError) -> Self {
        Self {
            response: Err(error),
            calls: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn extract_text(&self, _data: &[u8], _filename: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}
