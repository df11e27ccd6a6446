//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    entries: usize,
    resource_types: usize,
    loaded_at: String,
}

/// GET /health - Report the loaded bundle's size and load time
///
/// The bundle never changes after startup, so a running server is healthy.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        entries: state.bundle.len(),
        resource_types: state.bundle.resource_types().len(),
        loaded_at: state.loaded_at.to_rfc3339(),
    })
}
