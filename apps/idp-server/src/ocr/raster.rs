//! Page preparation
//!
//! Turns an uploaded document into a single PNG page image the OCR backends
//! can consume. PDFs contribute their first page only; raster images are
//! decoded and re-encoded so every backend sees the same format.

use std::io::Cursor;

use super::types::OcrError;

/// Minimum and maximum PDF render scale
const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 4.0;
/// Used when the configured scale is not a finite number
const DEFAULT_SCALE: f32 = 2.0;

/// Document kind, as far as page preparation is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Image,
}

/// Decide how to interpret the upload from its name and magic bytes
pub fn detect_kind(data: &[u8], filename: &str) -> SourceKind {
    if filename.to_lowercase().ends_with(".pdf") || data.starts_with(b"%PDF") {
        SourceKind::Pdf
    } else {
        SourceKind::Image
    }
}

/// Produce a PNG page image for OCR. CPU-bound; call from a blocking task.
pub fn prepare_page(data: &[u8], filename: &str, pdf_scale: f32) -> Result<Vec<u8>, OcrError> {
    match detect_kind(data, filename) {
        SourceKind::Pdf => render_first_page(data, effective_scale(pdf_scale)),
        SourceKind::Image => normalize_image(data),
    }
}

fn effective_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        DEFAULT_SCALE
    }
}

/// Decode a raster image and re-encode it as PNG
pub fn normalize_image(data: &[u8]) -> Result<Vec<u8>, OcrError> {
    let img = image::load_from_memory(data)
        .map_err(|_| OcrError::InvalidFile("Invalid image file".to_string()))?;

    encode_png(&img)
}

fn encode_png(img: &image::DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::ProcessingError(format!("Failed to encode page image: {}", e)))?;
    Ok(buffer)
}

fn ensure_pdf_header(data: &[u8]) -> Result<(), OcrError> {
    if data.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(OcrError::InvalidFile("Invalid PDF file".to_string()))
    }
}

/// Render page 1 of a PDF in-process with MuPDF
#[cfg(feature = "pdf-mupdf")]
pub fn render_first_page(data: &[u8], scale: f32) -> Result<Vec<u8>, OcrError> {
    use mupdf::{Colorspace, Document, Matrix};

    ensure_pdf_header(data)?;
    let doc = Document::from_bytes(data, "application/pdf")
        .map_err(|e| OcrError::InvalidFile(format!("Invalid PDF file: {}", e)))?;
    let page_count = doc
        .page_count()
        .map_err(|e| OcrError::InvalidFile(format!("Invalid PDF file: {}", e)))?;
    if page_count < 1 {
        return Err(OcrError::InvalidFile("Empty PDF".to_string()));
    }

    let render_err = |e: mupdf::Error| OcrError::ProcessingError(format!("Failed to render PDF: {}", e));
    let page = doc.load_page(0).map_err(render_err)?;
    let matrix = Matrix::new_scale(scale, scale);
    let pixmap = page
        .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
        .map_err(render_err)?;

    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in 0..(width as usize * height as usize) {
        let offset = pixel * n;
        for channel in 0..3 {
            rgb.push(samples.get(offset + channel).copied().unwrap_or(0));
        }
    }

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| OcrError::ProcessingError("Failed to create image buffer".to_string()))?;
    encode_png(&image::DynamicImage::ImageRgb8(img))
}

/// Render page 1 of a PDF with poppler's `pdftoppm`
#[cfg(not(feature = "pdf-mupdf"))]
pub fn render_first_page(data: &[u8], scale: f32) -> Result<Vec<u8>, OcrError> {
    use std::process::Command;

    ensure_pdf_header(data)?;

    let temp_dir = tempfile::TempDir::new()?;
    let input_path = temp_dir.path().join("input.pdf");
    std::fs::write(&input_path, data)?;

    // pdftoppm renders at 72 dpi for scale 1.0
    let dpi = ((72.0 * scale).round() as u32).to_string();
    let output_prefix = temp_dir.path().join("page");

    let output = Command::new("pdftoppm")
        .args(["-png", "-singlefile", "-f", "1", "-l", "1", "-r", &dpi])
        .arg(&input_path)
        .arg(&output_prefix)
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let page_path = temp_dir.path().join("page.png");
            std::fs::read(&page_path).map_err(|_| OcrError::InvalidFile("Empty PDF".to_string()))
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::InvalidFile(format!(
                "Invalid PDF file: {}",
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::ProviderNotAvailable(
            "pdftoppm not found (install poppler-utils)".to_string(),
        )),
        Err(e) => Err(OcrError::Io(e)),
    }
}
