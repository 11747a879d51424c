//! Request body decoding and validation

use axum::body::Bytes;
use fhir_facade_core::{Canned, Resource};
use serde_json::Value as JsonValue;

use super::context::RequestContext;
use super::negotiate;
use crate::codec::CodecError;
use crate::error::AppError;
use crate::state::AppState;

/// Decode a required request body and check it against the URL's resource type
pub fn decode(
    state: &AppState,
    ctx: &RequestContext,
    bytes: &Bytes,
    resource_type: &str,
    interaction: &str,
) -> Result<Resource, AppError> {
    let canned = &state.settings.canned;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::canned(canned, Canned::MissingBody, &[interaction]));
    }

    let format = negotiate::input_format(ctx.content_type.as_deref(), bytes);
    let resource = state.codec.decode(bytes, format).map_err(|err| match err {
        CodecError::Unsupported(format) => {
            AppError::canned(canned, Canned::UnsupportedMediaType, &[format.name()])
        }
        CodecError::Malformed(msg) => AppError::canned(canned, Canned::InvalidBody, &[&msg]),
    })?;

    if resource.resource_type() != resource_type {
        return Err(AppError::canned(
            canned,
            Canned::TypeMismatch,
            &[resource.resource_type(), resource_type],
        ));
    }
    Ok(resource)
}

/// Pin the body to `id`: a conflicting id is refused, a missing one is filled in
pub fn bind_id(state: &AppState, resource: &mut Resource, id: &str) -> Result<(), AppError> {
    match resource.id() {
        Some(body_id) if body_id != id => Err(AppError::canned(
            &state.settings.canned,
            Canned::IdMismatch,
            &[body_id, id],
        )),
        Some(_) => Ok(()),
        None => {
            resource.insert("id", JsonValue::String(id.to_string()));
            Ok(())
        }
    }
}
