//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::extraction::Extractor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extractor: Extractor,
    readiness: ServiceReadiness,
}

/// Whether each collaborator finished startup initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceReadiness {
    pub ocr: bool,
    pub llm: bool,
}

impl ServiceReadiness {
    pub fn ready() -> Self {
        Self { ocr: true, llm: true }
    }

    /// Ask both collaborators once whether they can serve requests
    pub async fn check(extractor: &Extractor) -> Self {
        let (ocr, llm) = tokio::join!(
            extractor.recognizer().is_available(),
            extractor.parser().is_available()
        );
        Self { ocr, llm }
    }
}

impl AppState {
    /// Create a new application state around constructed collaborators
    pub fn new(config: Config, extractor: Extractor) -> Self {
        Self::with_readiness(config, extractor, ServiceReadiness::ready())
    }

    /// Create a state whose health report uses `readiness`
    pub fn with_readiness(config: Config, extractor: Extractor, readiness: ServiceReadiness) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor,
                readiness,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn extractor(&self) -> &Extractor {
        &self.inner.extractor
    }

    /// Readiness recorded at startup
    pub fn readiness(&self) -> ServiceReadiness {
        self.inner.readiness
    }
}
