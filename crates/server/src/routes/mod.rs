pub mod bundle;
pub mod health;
pub mod metadata;
pub mod metrics;

use axum::{Router, routing::get};

use crate::AppState;

/// Build FHIR routes; operation paths are matched before `{resource_type}`
pub fn fhir_routes() -> Router<AppState> {
    Router::new()
        .route("/$resource-types", get(bundle::resource_types))
        .route("/$documents", get(bundle::documents))
        .route("/{resource_type}", get(bundle::search))
        .route("/{resource_type}/{id}", get(bundle::read))
}
