//! IDP Server Library
//!
//! Intelligent document processing: an uploaded PDF or image is run through
//! OCR, and the recognized text is mapped onto a JSON schema by a language
//! model. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `schema`: Target schema model and the built-in invoice schema
//! - `ocr`: Text recognizers (Tesseract, Ollama vision)
//! - `llm`: Structured parsers (OpenAI-compatible chat completions)
//! - `extraction`: The pipeline orchestrator
//! - `routes`: HTTP handlers

pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod ocr;
pub mod rate_limit;
pub mod routes;
pub mod schema;
pub mod state;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::error::{ErrorResponse, INTERNAL_ERROR_DETAIL};
use crate::extraction::MAX_FILE_SIZE;
use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let config = state.config();

    Router::new()
        .nest("/api/v1", routes::router(&config.rate_limit))
        .layer(DefaultBodyLimit::max(2 * MAX_FILE_SIZE as usize))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors))
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %message, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR_DETAIL)),
    )
        .into_response()
}
