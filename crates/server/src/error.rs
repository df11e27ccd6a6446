//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fhir_bundle::{IssueType, OperationOutcome};

/// Application error type, rendered as an OperationOutcome body
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, outcome) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, OperationOutcome::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, OperationOutcome::invalid(&msg)),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    OperationOutcome::error(IssueType::Exception, &msg),
                )
            }
        };

        (status, Json(outcome)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", err))
    }
}
