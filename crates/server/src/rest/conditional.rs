//! Conditional create, update and delete.
//!
//! These run a search and then act on its result. Nothing here is atomic: two
//! concurrent requests with the same criteria can both see the same matches
//! and both act. Exclusivity, where needed, has to come from the store.

use fhir_facade_core::{Bundle, Canned, Resource, StoreReply};

use super::context::RequestContext;
use super::headers::VersionHeaders;
use super::response::FhirResponse;
use crate::db::{CreateOptions, UpdateOptions};
use crate::error::AppError;
use crate::state::AppState;

/// What a store delete reply means for the client
#[derive(Debug)]
enum Deletion {
    /// Removed now; carries the deleted version when the reply names it
    Deleted(Option<String>),
    NeverExisted,
    AlreadyDeleted(Resource),
    Failed(StoreReply),
}

impl Deletion {
    fn classify(reply: StoreReply) -> Self {
        match reply.status() {
            Some(404) => Deletion::NeverExisted,
            Some(410) => Deletion::AlreadyDeleted(reply.into_outcome_without_hint()),
            Some(status) if !(200..300).contains(&status) => Deletion::Failed(reply),
            _ => match reply {
                StoreReply::Resource(resource) => Deletion::Deleted(resource.version_id()),
                StoreReply::Outcome { .. } => Deletion::Deleted(None),
            },
        }
    }
}

/// `(type, id)` of the matches that belong to `resource_type`
fn matches_of(bundle: &Bundle, resource_type: &str) -> Vec<String> {
    bundle
        .matched_keys()
        .into_iter()
        .filter(|(t, _)| t == resource_type)
        .map(|(_, id)| id)
        .collect()
}

/// ETag of the version a delete just produced. The lookup only runs for
/// registered types and a failure here does not undo the delete.
async fn deleted_etag(state: &AppState, resource_type: &str, id: &str) -> VersionHeaders {
    if !state.settings.known.contains(resource_type) {
        return VersionHeaders::default();
    }
    match state.store.deleted_version(resource_type, id).await {
        Ok(Some(version)) => VersionHeaders::etag_only(&version),
        Ok(None) => VersionHeaders::default(),
        Err(err) => {
            tracing::warn!(resource_type, id, error = ?err, "Deleted version lookup failed");
            VersionHeaders::default()
        }
    }
}

/// POST with `If-None-Exist`: create unless exactly one resource matches
pub async fn create(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    body: Resource,
    criteria: &str,
) -> Result<FhirResponse, AppError> {
    let bundle = state.store.search(resource_type, criteria).await?;
    let matches = bundle.match_count();
    tracing::info!(resource_type, criteria, matches, "Conditional create");

    if matches == 1 {
        let (outcome, status) = state
            .settings
            .canned
            .render(Canned::AlreadyExists, &[resource_type, criteria]);
        let existing = bundle
            .entry
            .into_iter()
            .find_map(|e| e.resource)
            .and_then(|v| Resource::from_value(v).ok());
        let versioning = existing
            .map(|r| VersionHeaders::derive(&r, &ctx.base_url))
            .unwrap_or_default();
        return Ok(FhirResponse::outcome(&outcome, status).with_versioning(&versioning));
    }

    let opts = CreateOptions {
        if_none_exist: Some(criteria.to_string()),
    };
    let reply = state.store.create(resource_type, &body, &opts).await?;
    Ok(FhirResponse::from_reply(reply, &ctx.base_url, 201).with_prefer(ctx.prefer))
}

/// PUT `/{type}?criteria`: create on no match, update the single match,
/// refuse on several
pub async fn update(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
    mut body: Resource,
) -> Result<FhirResponse, AppError> {
    let canned = &state.settings.canned;
    let criteria = ctx.criteria();
    if criteria.is_empty() {
        return Err(AppError::canned(canned, Canned::MissingQuery, &["update"]));
    }

    let bundle = state.store.search(resource_type, &criteria).await?;
    let matches = bundle.match_count();
    tracing::info!(resource_type, criteria = %criteria, matches, "Conditional update");

    match matches {
        0 => {
            let reply = state
                .store
                .create(resource_type, &body, &CreateOptions::default())
                .await?;
            Ok(FhirResponse::from_reply(reply, &ctx.base_url, 201).with_prefer(ctx.prefer))
        }
        1 => {
            let Some(id) = matches_of(&bundle, resource_type).into_iter().next() else {
                return Err(AppError::Internal(
                    "Search reported one match without a resource id".to_string(),
                ));
            };
            super::body::bind_id(state, &mut body, &id)?;
            let opts = UpdateOptions {
                if_match: ctx.if_match.clone(),
            };
            let reply = state.store.update(resource_type, &id, &body, &opts).await?;
            Ok(FhirResponse::from_reply(reply, &ctx.base_url, 200).with_prefer(ctx.prefer))
        }
        _ => Err(AppError::canned(
            canned,
            Canned::MultipleMatches,
            &[resource_type, &criteria],
        )),
    }
}

/// DELETE `/{type}/{id}` with idempotent semantics
pub async fn delete(
    state: &AppState,
    resource_type: &str,
    id: &str,
) -> Result<FhirResponse, AppError> {
    let reply = state.store.delete(resource_type, id).await?;
    match Deletion::classify(reply) {
        Deletion::Deleted(version) => {
            let versioning = match version {
                Some(version) => VersionHeaders::etag_only(&version),
                None => deleted_etag(state, resource_type, id).await,
            };
            Ok(FhirResponse::empty(204).with_versioning(&versioning))
        }
        Deletion::NeverExisted => {
            tracing::debug!(resource_type, id, "Delete of unknown resource");
            Ok(FhirResponse::empty(204))
        }
        Deletion::AlreadyDeleted(outcome) => {
            let versioning = deleted_etag(state, resource_type, id).await;
            Ok(FhirResponse::new(Some(outcome.into_value()), 200).with_versioning(&versioning))
        }
        Deletion::Failed(reply) => Ok(FhirResponse::new(
            Some(reply.into_resource().into_value()),
            200,
        )),
    }
}

/// DELETE `/{type}?criteria`
pub async fn delete_matching(
    state: &AppState,
    ctx: &RequestContext,
    resource_type: &str,
) -> Result<FhirResponse, AppError> {
    let settings = &state.settings;
    let criteria = ctx.criteria();
    if criteria.is_empty() {
        return Err(AppError::canned(&settings.canned, Canned::MissingQuery, &["delete"]));
    }

    let bounded = format!("{}&_count={}", criteria, settings.max_conditional_delete);
    let bundle = state.store.search(resource_type, &bounded).await?;
    let matches = bundle.match_count();
    let mut ids = matches_of(&bundle, resource_type);
    ids.truncate(settings.max_conditional_delete);
    tracing::info!(resource_type, criteria = %criteria, matches, "Conditional delete");

    match matches {
        0 => {
            let (outcome, status) = settings
                .canned
                .render(Canned::NothingToDelete, &[resource_type, &criteria]);
            Ok(FhirResponse::outcome(&outcome, status))
        }
        1 => {
            let Some(id) = ids.first() else {
                return Err(AppError::Internal(
                    "Search reported one match without a resource id".to_string(),
                ));
            };
            let reply = state.store.delete(resource_type, id).await?;
            match Deletion::classify(reply) {
                Deletion::Failed(reply) => {
                    Ok(FhirResponse::new(Some(reply.into_resource().into_value()), 200))
                }
                _ => {
                    let versioning = deleted_etag(state, resource_type, id).await;
                    Ok(FhirResponse::empty(204).with_versioning(&versioning))
                }
            }
        }
        _ if !settings.multiple_delete => Err(AppError::canned(
            &settings.canned,
            Canned::MultipleDisallowed,
            &[resource_type, &criteria],
        )),
        _ => {
            let mut deleted = 0usize;
            for id in &ids {
                match Deletion::classify(state.store.delete(resource_type, id).await?) {
                    Deletion::Deleted(_) => deleted += 1,
                    other => tracing::warn!(
                        resource_type,
                        id = %id,
                        result = ?other,
                        "Match not deleted"
                    ),
                }
            }
            tracing::info!(resource_type, deleted, "Deleted multiple resources");
            let (outcome, status) = settings.canned.render(
                Canned::DeletedMany,
                &[&deleted.to_string(), resource_type, &criteria],
            );
            Ok(FhirResponse::outcome(&outcome, status))
        }
    }
}
