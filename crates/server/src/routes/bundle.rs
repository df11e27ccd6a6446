//! Read-only handlers over the loaded bundle

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use fhir_bundle::{Bundle, Entry, INDEXED_RESOURCE_TYPES, TextDocument, index_documents};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;
use crate::error::AppError;

#[derive(Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    resource_type: String,
    count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypesResponse {
    resource_types: Vec<String>,
    counts: Vec<TypeCount>,
}

/// GET /fhir/$resource-types - Distinct resource types in first-seen order
pub async fn resource_types(State(state): State<AppState>) -> Json<ResourceTypesResponse> {
    let counts: Vec<TypeCount> = state
        .bundle
        .count_by_type()
        .into_iter()
        .map(|(resource_type, count)| TypeCount {
            resource_type: resource_type.to_string(),
            count,
        })
        .collect();

    tracing::debug!(types = counts.len(), "Listed resource types");

    Json(ResourceTypesResponse {
        resource_types: counts.iter().map(|c| c.resource_type.clone()).collect(),
        counts,
    })
}

/// GET /fhir/{resource_type} - Searchset of every resource with that type
///
/// Unknown types produce an empty searchset.
pub async fn search(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
) -> impl IntoResponse {
    let entries: Vec<Entry> = state
        .bundle
        .entries_of_type(&resource_type)
        .into_iter()
        .map(|entry| {
            let mut matched = Entry::new(entry.full_url.clone(), entry.resource.clone());
            matched
                .extra
                .insert("search".to_string(), json!({ "mode": "match" }));
            matched
        })
        .collect();

    tracing::debug!(resource_type = %resource_type, matches = entries.len(), "Searched bundle");

    Json(Bundle::searchset(entries))
}

/// GET /fhir/{resource_type}/{id} - Read one resource
pub async fn read(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    match state.bundle.find_resource(&resource_type, &id) {
        Some(resource) => Ok(Json(resource.clone())),
        None => Err(AppError::NotFound(format!(
            "{}/{} not found",
            resource_type, id
        ))),
    }
}

/// Query parameters for `$documents`
#[derive(Debug, Deserialize, Default)]
pub struct DocumentParams {
    /// Comma-separated resource types
    pub types: Option<String>,
}

impl DocumentParams {
    fn resource_types(&self) -> Result<Vec<String>, AppError> {
        let Some(raw) = &self.types else {
            return Ok(INDEXED_RESOURCE_TYPES.iter().map(|t| t.to_string()).collect());
        };

        let types: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if types.is_empty() {
            return Err(AppError::BadRequest(
                "Parameter 'types' must name at least one resource type".to_string(),
            ));
        }
        Ok(types)
    }
}

/// GET /fhir/$documents - Plain-text documents for an indexer
pub async fn documents(
    State(state): State<AppState>,
    Query(params): Query<DocumentParams>,
) -> Result<Json<Vec<TextDocument>>, AppError> {
    let types = params.resource_types()?;
    let documents = index_documents(&state.bundle, &types)?;
    Ok(Json(documents))
}
