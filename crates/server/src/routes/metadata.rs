//! Metadata endpoint handler

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::Response,
};

use crate::rest::{RequestContext, interactions, respond};
use crate::state::AppState;

/// GET /metadata - Return the server CapabilityStatement with search parameters
pub async fn get(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let ctx = RequestContext::from_request(&headers, &uri);
    let result = interactions::capabilities(&state).await;
    respond(&state, &ctx, result)
}
