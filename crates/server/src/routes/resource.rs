//! Resource interaction HTTP handlers

use std::future::Future;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::Response,
};

use crate::error::AppError;
use crate::rest::{FhirResponse, RequestContext, conditional, guard, interactions, respond};
use crate::state::AppState;

/// Run `op` only when the resource type is registered
async fn guarded(
    state: &AppState,
    resource_type: &str,
    op: impl Future<Output = Result<FhirResponse, AppError>>,
) -> Result<FhirResponse, AppError> {
    guard::ensure_known(&state.settings, resource_type)?;
    op.await
}

/// POST /{type} - Create a resource, conditionally with If-None-Exist
pub async fn create(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::create(&state, &ctx, &resource_type, &body);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// GET /{type}/{id} - Read a resource, honouring _summary
pub async fn read(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::read(&state, &ctx, &resource_type, &id);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// GET /{type}/{id}/_history/{vid} - Read a specific version
pub async fn vread(
    State(state): State<AppState>,
    Path((resource_type, id, version_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::vread(&state, &ctx, &resource_type, &id, &version_id);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// PUT /{type}/{id} - Update (or create) a resource
pub async fn update(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::update(&state, &ctx, &resource_type, &id, &body);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// PUT /{type}?criteria - Conditional update
pub async fn conditional_update(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::conditional_update(&state, &ctx, &resource_type, &body);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// DELETE /{type}/{id} - Delete a resource; deleting nothing is not an error
pub async fn delete(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = conditional::delete(&state, &resource_type, &id);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// DELETE /{type}?criteria - Conditional delete
pub async fn conditional_delete(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = conditional::delete_matching(&state, &ctx, &resource_type);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// GET /{type}/{id}/_history - Version history of a resource
pub async fn history(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::history(&state, &ctx, &resource_type, &id);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}

/// GET /{type}?query - Search
pub async fn search(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let op = interactions::search(&state, &ctx, &resource_type);
    let result = guarded(&state, &resource_type, op).await;
    respond(&state, &ctx, result)
}
