pub mod health;
pub mod metadata;
mod resource;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build FHIR routes
pub fn fhir_routes() -> Router<AppState> {
    Router::new()
        .route("/metadata", get(metadata::get))
        .route(
            "/{resource_type}",
            get(resource::search)
                .post(resource::create)
                .put(resource::conditional_update)
                .delete(resource::conditional_delete),
        )
        .route(
            "/{resource_type}/{id}",
            get(resource::read)
                .put(resource::update)
                .delete(resource::delete),
        )
        .route("/{resource_type}/{id}/_history", get(resource::history))
        .route(
            "/{resource_type}/{id}/_history/{version_id}",
            get(resource::vread),
        )
}
