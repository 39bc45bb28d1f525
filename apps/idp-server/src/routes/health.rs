//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub ocr: Readiness,
    pub llm: Readiness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotInitialized,
}

impl From<bool> for Readiness {
    fn from(available: bool) -> Self {
        if available {
            Readiness::Ready
        } else {
            Readiness::NotInitialized
        }
    }
}

/// Report service status and the readiness recorded at startup.
///
/// Collaborators are not contacted here.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let readiness = state.readiness();

    Json(HealthResponse {
        status: "healthy",
        services: ServiceStatus {
            ocr: readiness.ocr.into(),
            llm: readiness.llm.into(),
        },
    })
}
