//! Metadata endpoint handler

use axum::{Json, extract::State};
use fhir_bundle::CapabilityStatement;

use crate::AppState;

/// GET /metadata - Capability statement for the loaded bundle
pub async fn get(State(state): State<AppState>) -> Json<CapabilityStatement> {
    Json(CapabilityStatement::for_bundle(&state.bundle))
}
