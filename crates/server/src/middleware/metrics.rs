//! Prometheus metrics collection middleware
//!
//! Records `http_requests_total` (counter) and `http_request_duration_seconds`
//! (histogram) for every request, labelled by method, route and status.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Collapse resource ids so label cardinality stays bounded.
///
/// `/fhir/{type}/{id}` keeps the type and replaces the id with `:id`.
/// Operation paths (`/fhir/$...`) are kept as they are.
fn route_label(path: &str) -> String {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["fhir", resource_type, _id] if !resource_type.starts_with('$') => {
            format!("/fhir/{resource_type}/:id")
        }
        _ => path.to_string(),
    }
}

/// Middleware that records request count and duration metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(request.uri().path());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => route.clone(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => route
    )
    .record(elapsed);

    response
}
