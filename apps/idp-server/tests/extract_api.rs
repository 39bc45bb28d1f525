//! HTTP contract tests for `/api/v1/extract` and `/api/v1/health`

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::{
    jpeg_bytes, pdf_bytes, server, server_with_limits, server_with_readiness, StubParser,
    StubRecognizer,
};
use idp_server::config::RateLimitConfig;
use idp_server::extraction::Extractor;
use idp_server::ocr::{OcrError, TesseractRecognizer};
use idp_server::state::ServiceReadiness;

const EXTRACT: &str = "/api/v1/extract";
const HEALTH: &str = "/api/v1/health";

fn file_form(bytes: Vec<u8>, filename: &str, content_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name(filename).mime_type(content_type),
    )
}

#[tokio::test]
async fn test_rejects_disallowed_content_type() {
    let recognizer = StubRecognizer::returning("text");
    let parser = StubParser::returning(json!({}));
    let server = server(recognizer.clone(), parser.clone());

    let response = server
        .post(EXTRACT)
        .multipart(file_form(vec![0x4D, 0x5A, 0x90, 0x00], "malware.exe", "application/x-msdownload"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert!(body["detail"].as_str().unwrap().contains("Invalid file type"));
    assert_eq!(recognizer.calls(), 0);
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_rejects_oversized_pdf() {
    let recognizer = StubRecognizer::returning("text");
    let server = server(recognizer.clone(), StubParser::returning(json!({})));

    let mut bytes = pdf_bytes();
    bytes.resize(11 * 1024 * 1024, b' ');

    let response = server
        .post(EXTRACT)
        .multipart(file_form(bytes, "large.pdf", "application/pdf"))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.json::<Value>();
    assert!(body["detail"].as_str().unwrap().contains("too large"));
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_extracts_invoice_from_jpeg() {
    let recognizer = StubRecognizer::returning("INVOICE #001\nTotal: 100000");
    let parser = StubParser::returning(json!({"invoice_number": "001", "total_amount": 100000}));
    let server = server(recognizer.clone(), parser.clone());

    let response = server
        .post(EXTRACT)
        .multipart(file_form(jpeg_bytes(), "invoice.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "success");
    assert_eq!(body["filename"], "invoice.jpg");
    assert_eq!(body["data"]["invoice_number"], "001");
    assert_eq!(body["data"]["total_amount"], 100000);
    assert_eq!(body["raw_text"], "INVOICE #001\nTotal: 100000");
    assert_eq!(body["extraction_schema_used"]["vendor_name"]["required"], true);
    assert_eq!(recognizer.calls(), 1);
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn test_blank_document_reports_no_text() {
    let parser = StubParser::returning(json!({}));
    let server = server(StubRecognizer::returning(""), parser.clone());

    let response = server
        .post(EXTRACT)
        .multipart(file_form(jpeg_bytes(), "blank.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "No text detected in document");
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["raw_text"], Value::Null);
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_parser_failure_is_500() {
    let server = server(
        StubRecognizer::returning("INVOICE #001"),
        StubParser::failing("LLM API error"),
    );

    let response = server
        .post(EXTRACT)
        .multipart(file_form(pdf_bytes(), "invoice.pdf", "application/pdf"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("LLM failed"), "{detail}");
    assert!(detail.contains("LLM API error"), "{detail}");
}

#[tokio::test]
async fn test_recognizer_failure_is_500() {
    let server = server(
        StubRecognizer::failing(|| OcrError::ProcessingError("Tesseract engine crashed".into())),
        StubParser::returning(json!({})),
    );

    let response = server
        .post(EXTRACT)
        .multipart(file_form(jpeg_bytes(), "scan.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("OCR failed"), "{detail}");
    assert!(detail.contains("Tesseract engine crashed"), "{detail}");
}

#[tokio::test]
async fn test_malformed_schema_is_400() {
    let recognizer = StubRecognizer::returning("text");
    let server = server(recognizer.clone(), StubParser::returning(json!({})));

    let form = file_form(jpeg_bytes(), "invoice.jpg", "image/jpeg")
        .add_text("schema_config", "{invalid json}");
    let response = server.post(EXTRACT).multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["detail"], "Invalid JSON in schema_config");
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn test_custom_schema_is_echoed() {
    let server = server(
        StubRecognizer::returning("Receipt total 42"),
        StubParser::returning(json!({"total": 42})),
    );

    let schema = json!({"total": {"type": "NUMBER", "description": "Grand total", "required": true}});
    let form = file_form(jpeg_bytes(), "receipt.jpg", "image/jpeg")
        .add_text("schema_config", schema.to_string());
    let response = server.post(EXTRACT).multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(
        body["extraction_schema_used"],
        json!({"total": {"type": "NUMBER", "description": "Grand total", "required": true}})
    );
}

#[tokio::test]
async fn test_field_list_schema_is_accepted() {
    let recognizer = StubRecognizer::returning("ACME Corp");
    let parser = StubParser::returning(json!({"vendor_name": "ACME Corp"}));
    let server = server(recognizer.clone(), parser.clone());

    let fields = json!([
        {"id": "a1", "key": "vendor_name", "description": "Vendor", "type": "STRING", "required": true}
    ]);
    let form = file_form(jpeg_bytes(), "invoice.jpg", "image/jpeg")
        .add_text("schema_config", fields.to_string());
    let response = server.post(EXTRACT).multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["data"]["vendor_name"], "ACME Corp");
    assert_eq!(body["extraction_schema_used"], fields);
    assert_eq!(recognizer.calls(), 1);
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn test_unrecognized_field_type_is_accepted() {
    let recognizer = StubRecognizer::returning("INVOICE #001");
    let parser = StubParser::returning(json!({"invoice_number": 1}));
    let server = server(recognizer.clone(), parser.clone());

    let form = file_form(jpeg_bytes(), "invoice.jpg", "image/jpeg").add_text(
        "schema_config",
        r#"{"invoice_number":{"type":"integer","required":true}}"#,
    );
    let response = server.post(EXTRACT).multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["invoice_number"], 1);
    assert_eq!(recognizer.calls(), 1);
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn test_undecodable_image_is_400() {
    let parser = StubParser::returning(json!({}));
    let server = server(Arc::new(TesseractRecognizer::new("eng", 2.0)), parser.clone());

    let response = server
        .post(EXTRACT)
        .multipart(file_form(b"not an image".to_vec(), "invalid.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["detail"], "Invalid image file");
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_pdf_upload_without_pdf_content_is_400() {
    let parser = StubParser::returning(json!({}));
    let server = server(Arc::new(TesseractRecognizer::new("eng", 2.0)), parser.clone());

    let response = server
        .post(EXTRACT)
        .multipart(file_form(b"plain text renamed".to_vec(), "invoice.pdf", "application/pdf"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["detail"], "Invalid PDF file");
    assert_eq!(parser.calls(), 0);
}

#[tokio::test]
async fn test_missing_file_part_is_400() {
    let server = server(StubRecognizer::returning("text"), StubParser::returning(json!({})));

    let form = MultipartForm::new().add_text("schema_config", "{}");
    let response = server.post(EXTRACT).multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("No file provided"), "{detail}");
}

#[tokio::test]
async fn test_recognizer_panic_is_internal_error() {
    let server = server(StubRecognizer::panicking(), StubParser::returning(json!({})));

    let response = server
        .post(EXTRACT)
        .multipart(file_form(jpeg_bytes(), "scan.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({"detail": "Internal server error"}));
}

#[tokio::test]
async fn test_health_reports_startup_readiness() {
    let parser = StubParser::unavailable();
    let extractor = Extractor::new(StubRecognizer::returning(""), parser.clone());
    let readiness = ServiceReadiness::check(&extractor).await;
    assert_eq!(parser.availability_checks(), 1);

    let server = server_with_readiness(StubRecognizer::returning(""), parser.clone(), readiness);
    let response = server.get(HEALTH).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "healthy", "services": {"ocr": "ready", "llm": "not_initialized"}})
    );
    assert_eq!(parser.availability_checks(), 1);
}

#[tokio::test]
async fn test_health_does_not_contact_collaborators() {
    let parser = StubParser::unavailable();
    let server = server(StubRecognizer::returning(""), parser.clone());

    for _ in 0..3 {
        let response = server.get(HEALTH).await;
        assert_eq!(response.json::<Value>()["services"]["llm"], "ready");
    }
    assert_eq!(parser.availability_checks(), 0);
}

#[tokio::test]
async fn test_health_is_rate_limited() {
    let server = server_with_limits(
        StubRecognizer::returning(""),
        StubParser::returning(json!({})),
        RateLimitConfig {
            extract_per_minute: 100,
            health_per_minute: 2,
        },
    );

    assert_eq!(server.get(HEALTH).await.status_code(), StatusCode::OK);
    assert_eq!(server.get(HEALTH).await.status_code(), StatusCode::OK);

    let response = server.get(HEALTH).await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.json::<Value>()["detail"],
        "Rate limit exceeded: 2 per 1 minute"
    );
    assert!(response.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn test_limits_are_per_route() {
    let server = server_with_limits(
        StubRecognizer::returning(""),
        StubParser::returning(json!({})),
        RateLimitConfig {
            extract_per_minute: 100,
            health_per_minute: 1,
        },
    );

    assert_eq!(server.get(HEALTH).await.status_code(), StatusCode::OK);
    assert_eq!(
        server.get(HEALTH).await.status_code(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = server
        .post(EXTRACT)
        .multipart(file_form(jpeg_bytes(), "blank.jpg", "image/jpeg"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}
