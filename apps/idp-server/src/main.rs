//! IDP Server
//!
//! Extracts structured JSON from uploaded invoices and receipts using OCR
//! followed by a language model.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idp_server::config::Config;
use idp_server::extraction::Extractor;
use idp_server::llm::{ChatCompletionsParser, StructuredParser};
use idp_server::ocr::{OllamaRecognizer, RecognizerKind, TesseractRecognizer, TextRecognizer};
use idp_server::state::{AppState, ServiceReadiness};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idp_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting IDP Server v{}", env!("CARGO_PKG_VERSION"));

    let recognizer = build_recognizer(&config)?;
    tracing::info!(provider = ?recognizer.kind(), "OCR recognizer initialized");

    let parser: Arc<dyn StructuredParser> = Arc::new(
        ChatCompletionsParser::new(config.llm.clone())
            .context("Failed to initialize LLM client")?,
    );
    tracing::info!(model = %config.llm.model, base_url = %config.llm.base_url, "LLM parser initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!("Invalid bind address {}:{}", config.server.host, config.server.port)
        })?;

    let extractor = Extractor::new(recognizer, parser);
    let readiness = ServiceReadiness::check(&extractor).await;
    if !readiness.ocr {
        tracing::warn!("OCR backend did not answer its startup check");
    }
    if !readiness.llm {
        tracing::warn!("LLM backend did not answer its startup check");
    }

    let state = AppState::with_readiness(config, extractor, readiness);
    let app = idp_server::app(state);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("IDP Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn build_recognizer(config: &Config) -> anyhow::Result<Arc<dyn TextRecognizer>> {
    let ocr = &config.ocr;
    let recognizer: Arc<dyn TextRecognizer> = match ocr.provider {
        RecognizerKind::Tesseract => Arc::new(
            TesseractRecognizer::detect(&ocr.language, ocr.pdf_scale)
                .context("Failed to initialize Tesseract")?,
        ),
        RecognizerKind::Ollama => Arc::new(
            OllamaRecognizer::new(&ocr.ollama_url, &ocr.ollama_model, ocr.pdf_scale)
                .context("Failed to initialize Ollama recognizer")?,
        ),
    };
    Ok(recognizer)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
