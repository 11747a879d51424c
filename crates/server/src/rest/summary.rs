//! `_summary` handling for instance reads

use fhir_facade_core::{
    Resource, StoreReply, SummaryMode,
    summary::{mark_subsetted, retain_text, strip_text},
};
use url::form_urlencoded;

use crate::error::AppError;
use crate::state::AppState;

/// Read `resource_type/id` projected according to `mode`.
///
/// `true` asks the store for its own summary via search and falls back to a
/// plain read unless exactly one entry comes back. `data` and `text` project a
/// full read locally. Every projected resource is tagged SUBSETTED.
pub async fn project(
    state: &AppState,
    resource_type: &str,
    id: &str,
    mode: SummaryMode,
) -> Result<StoreReply, AppError> {
    if !mode.requires_projection() {
        return state.store.read(resource_type, id).await;
    }

    let reply = match mode {
        SummaryMode::True => match store_summary(state, resource_type, id).await? {
            Some(resource) => StoreReply::Resource(resource),
            None => state.store.read(resource_type, id).await?,
        },
        SummaryMode::Data | SummaryMode::Text | SummaryMode::False => {
            state.store.read(resource_type, id).await?
        }
    };

    let mut resource = match reply {
        StoreReply::Resource(resource) => resource,
        other => return Ok(other),
    };

    match mode {
        SummaryMode::Data => strip_text(&mut resource),
        SummaryMode::Text => retain_text(&mut resource, state.schema.as_ref()),
        SummaryMode::True | SummaryMode::False => {}
    }
    mark_subsetted(&mut resource);

    tracing::debug!(resource_type, id, ?mode, "Projected summary");
    Ok(StoreReply::Resource(resource))
}

async fn store_summary(
    state: &AppState,
    resource_type: &str,
    id: &str,
) -> Result<Option<Resource>, AppError> {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("_id", id)
        .append_pair("_summary", "true")
        .finish();
    let bundle = state.store.search(resource_type, &query).await?;
    if bundle.match_count() != 1 {
        return Ok(None);
    }
    Ok(bundle
        .entry
        .into_iter()
        .find_map(|entry| entry.resource)
        .and_then(|value| Resource::from_value(value).ok()))
}
