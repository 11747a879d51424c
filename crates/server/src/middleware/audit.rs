//! Audit trail of FHIR write interactions

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};

use super::request_id::RequestId;

/// FHIR interaction name of a write request, `None` for reads
fn interaction(request: &Request<Body>) -> Option<&'static str> {
    let instance = request.uri().path().trim_matches('/').contains('/');
    let conditional = request.headers().contains_key("if-none-exist");
    match (request.method(), instance) {
        (&Method::POST, _) if conditional => Some("conditional-create"),
        (&Method::POST, _) => Some("create"),
        (&Method::PUT, true) => Some("update"),
        (&Method::PUT, false) => Some("conditional-update"),
        (&Method::DELETE, true) => Some("delete"),
        (&Method::DELETE, false) => Some("conditional-delete"),
        _ => None,
    }
}

/// Log every create, update and delete with the status the client saw
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(interaction) = interaction(&request) else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(axum::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info!(
        target: "audit",
        request_id = %request_id,
        interaction,
        path = %path,
        query = %query,
        status,
        location,
        "FHIR write"
    );

    response
}
