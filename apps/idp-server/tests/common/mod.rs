//! Shared fixtures for HTTP-level tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::Value;

use idp_server::config::{Config, RateLimitConfig};
use idp_server::extraction::Extractor;
use idp_server::llm::{LlmError, StructuredParser};
use idp_server::ocr::{OcrError, RecognizerKind, TextRecognizer};
use idp_server::schema::TargetSchema;
use idp_server::state::{AppState, ServiceReadiness};

/// Recognizer returning a canned outcome and counting calls
pub struct StubRecognizer {
    outcome: Outcome,
    calls: AtomicUsize,
}

enum Outcome {
    Text(String),
    Error(fn() -> OcrError),
    Panic,
}

impl StubRecognizer {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Outcome::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: fn() -> OcrError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Outcome::Error(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn panicking() -> Arc<Self> {
        Arc::new(Self {
            outcome: Outcome::Panic,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for StubRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn extract_text(&self, _data: &[u8], _filename: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Text(text) => Ok(text.clone()),
            Outcome::Error(make_error) => Err(make_error()),
            Outcome::Panic => panic!("recognizer exploded"),
        }
    }
}

/// Parser returning a canned value or API error and counting calls
pub struct StubParser {
    response: Result<Value, String>,
    available: bool,
    calls: AtomicUsize,
    availability_checks: AtomicUsize,
}

impl StubParser {
    pub fn returning(value: Value) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(value),
            available: true,
            calls: AtomicUsize::new(0),
            availability_checks: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(message.to_string()),
            available: true,
            calls: AtomicUsize::new(0),
            availability_checks: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            response: Ok(Value::Null),
            available: false,
            calls: AtomicUsize::new(0),
            availability_checks: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredParser for StubParser {
    async fn is_available(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    async fn parse_document(&self, _text: &str, _schema: &TargetSchema) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(LlmError::Api)
    }
}

pub fn server(recognizer: Arc<dyn TextRecognizer>, parser: Arc<dyn StructuredParser>) -> TestServer {
    server_with_limits(recognizer, parser, RateLimitConfig::default())
}

pub fn server_with_limits(
    recognizer: Arc<dyn TextRecognizer>,
    parser: Arc<dyn StructuredParser>,
    rate_limit: RateLimitConfig,
) -> TestServer {
    let config = Config {
        rate_limit,
        ..Config::default()
    };
    start(AppState::new(config, Extractor::new(recognizer, parser)))
}

pub fn server_with_readiness(
    recognizer: Arc<dyn TextRecognizer>,
    parser: Arc<dyn StructuredParser>,
    readiness: ServiceReadiness,
) -> TestServer {
    let extractor = Extractor::new(recognizer, parser);
    start(AppState::with_readiness(Config::default(), extractor, readiness))
}

fn start(state: AppState) -> TestServer {
    TestServer::new(idp_server::app(state)).expect("failed to start test server")
}

/// Smallest byte string that starts like a JPEG
pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0u8; 1024]);
    bytes
}

pub fn pdf_bytes() -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend_from_slice(&[b' '; 1024]);
    bytes
}
