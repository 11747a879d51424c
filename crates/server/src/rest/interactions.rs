//! Plain FHIR interactions: read, vread, create, update, search, history,
//! capabilities. Delete and the conditional forms live in `conditional`.

use axum::body::Bytes;
use fhir_facade_core::{Bundle, CapabilityStatement, SearchParameter, StoreReply};

use super::body;
use super::conditional;
use super::context::RequestContext;
use super::headers::VersionHeaders;
use super::response::FhirResponse;
use super::summary;
use crate::db::{CreateOptions, UpdateOptions};
use crate::error::AppError;
use crate::state::AppState;

fn bundle_response(ctx: &RequestContext, mut bundle: Bundle) -> Result<FhirResponse, AppError> {
    bundle.enrich_full_urls(&ctx.base_url);
    FhirResponse::json(&bundle, 200)
}

/// Read replies carry ETag and Last-Modified but no Location
fn fetched(ctx: &RequestContext, reply: StoreReply) -> FhirResponse {
    let resource = reply.into_resource();
    let versioning = VersionHeaders::derive(&resource, &ctx.base_url).without_location();
    FhirResponse::new(Some(resource.into_value()), 200).with_versioning(&versioning)
}

/// GET /{type}/{id}
pub async fn read(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    id: &str,
) -> Result<FhirResponse, AppError> {
    let reply = summary::project(state, resource_type, id, ctx.summary).await?;
    Ok(fetched(ctx, reply))
}

/// GET /{type}/{id}/_history/{vid}
pub async fn vread(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    id: &str,
    version_id: &str,
) -> Result<FhirResponse, AppError> {
    let reply = state.store.vread(resource_type, id, version_id).await?;
    Ok(fetched(ctx, reply))
}

/// POST /{type}, conditional when `If-None-Exist` is present
pub async fn create(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    bytes: &Bytes,
) -> Result<FhirResponse, AppError> {
    let resource = body::decode(state, ctx, bytes, resource_type, "create")?;

    if let Some(criteria) = ctx.if_none_exist.as_deref() {
        return conditional::create(state, ctx, resource_type, resource, criteria).await;
    }

    let reply = state
        .store
        .create(resource_type, &resource, &CreateOptions::default())
        .await?;
    tracing::info!(resource_type, created = reply.is_resource(), "Create");
    Ok(FhirResponse::from_reply(reply, &ctx.base_url, 201).with_prefer(ctx.prefer))
}

/// PUT /{type}/{id}. Answers 200 when the resource existed, 201 when the
/// update created it.
pub async fn update(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    id: &str,
    bytes: &Bytes,
) -> Result<FhirResponse, AppError> {
    let mut resource = body::decode(state, ctx, bytes, resource_type, "update")?;
    body::bind_id(state, &mut resource, id)?;

    let existed = state.store.read(resource_type, id).await?.is_resource();
    let opts = UpdateOptions {
        if_match: ctx.if_match.clone(),
    };
    let reply = state.store.update(resource_type, id, &resource, &opts).await?;
    tracing::info!(resource_type, id, existed, "Update");

    let status = if existed { 200 } else { 201 };
    Ok(FhirResponse::from_reply(reply, &ctx.base_url, status).with_prefer(ctx.prefer))
}

/// PUT /{type}?criteria
pub async fn conditional_update(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    bytes: &Bytes,
) -> Result<FhirResponse, AppError> {
    let resource = body::decode(state, ctx, bytes, resource_type, "update")?;
    conditional::update(state, ctx, resource_type, resource).await
}

/// GET /{type}?query
pub async fn search(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
) -> Result<FhirResponse, AppError> {
    let bundle = state.store.search(resource_type, &ctx.store_query()).await?;
    bundle_response(ctx, bundle)
}

/// GET /{type}/{id}/_history
pub async fn history(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    id: &str,
) -> Result<FhirResponse, AppError> {
    let bundle = state.store.history(resource_type, id).await?;
    bundle_response(ctx, bundle)
}

/// GET /metadata
pub async fn capabilities(state: &AppState) -> Result<FhirResponse, AppError> {
    let bundle = state.store.search_parameters().await?;
    let params: Vec<SearchParameter> = bundle
        .entry
        .iter()
        .filter_map(|e| e.resource.as_ref())
        .filter_map(SearchParameter::from_resource)
        .collect();

    let settings = &state.settings;
    let statement =
        CapabilityStatement::new(&settings.known).augment(&params, &settings.capability);
    tracing::debug!(search_params = params.len(), "Built capability statement");
    FhirResponse::json(&statement, 200)
}
