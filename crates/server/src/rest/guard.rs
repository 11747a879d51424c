//! Unknown-resource guard

use fhir_facade_core::Canned;

use crate::error::AppError;
use crate::state::Settings;

/// Refuse resource types the deployment does not register
pub fn ensure_known(settings: &Settings, resource_type: &str) -> Result<(), AppError> {
    if settings.known.contains(resource_type) {
        return Ok(());
    }
    tracing::debug!(resource_type, "Rejecting unknown resource type");
    Err(AppError::canned(
        &settings.canned,
        Canned::UnknownResource,
        &[resource_type, &settings.known.listing()],
    ))
}
