//! Response assembly
//!
//! Every handler result, success or failure, goes through `assemble`. An
//! OperationOutcome body carrying a status hint overrides the handler's status.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use fhir_facade_core::{Canned, OperationOutcome, StoreReply, outcome::status_hint};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::context::RequestContext;
use super::headers::{PreferReturn, VersionHeaders};
use super::negotiate::Format;
use crate::codec::CodecError;
use crate::error::AppError;
use crate::state::AppState;

/// Domain result of an interaction, before rendering
#[derive(Debug, Clone)]
pub struct FhirResponse {
    pub body: Option<JsonValue>,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Prefer handling applied to this response; reads leave it at Representation
    pub prefer: PreferReturn,
}

impl FhirResponse {
    pub fn new(body: Option<JsonValue>, status: u16) -> Self {
        Self {
            body,
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            prefer: PreferReturn::Representation,
        }
    }

    pub fn json<T: Serialize>(body: &T, status: u16) -> Result<Self, AppError> {
        Ok(Self::new(Some(serde_json::to_value(body)?), status))
    }

    pub fn outcome(outcome: &OperationOutcome, status: u16) -> Self {
        Self::new(Some(outcome.to_resource().into_value()), status)
    }

    pub fn empty(status: u16) -> Self {
        Self::new(None, status)
    }

    /// Store reply with the versioning headers derived from its meta
    pub fn from_reply(reply: StoreReply, base_url: &str, status: u16) -> Self {
        let resource = reply.into_resource();
        let versioning = VersionHeaders::derive(&resource, base_url);
        Self::new(Some(resource.into_value()), status).with_versioning(&versioning)
    }

    pub fn with_versioning(mut self, versioning: &VersionHeaders) -> Self {
        versioning.apply(&mut self.headers);
        self
    }

    pub fn with_prefer(mut self, prefer: PreferReturn) -> Self {
        self.prefer = prefer;
        self
    }
}

fn is_outcome(body: &JsonValue) -> bool {
    body.get("resourceType").and_then(JsonValue::as_str) == Some("OperationOutcome")
}

/// Turn a handler result into the HTTP response
pub fn respond(
    state: &AppState,
    ctx: &RequestContext,
    result: Result<FhirResponse, AppError>,
) -> Response {
    let reply = result.unwrap_or_else(|err| err.into_response(&state.settings.canned));
    assemble(state, ctx, reply)
}

pub fn assemble(state: &AppState, ctx: &RequestContext, reply: FhirResponse) -> Response {
    let FhirResponse {
        body,
        status,
        mut headers,
        prefer,
    } = reply;

    let outcome_body = body.as_ref().is_some_and(is_outcome);
    let status = body
        .as_ref()
        .filter(|b| is_outcome(b))
        .and_then(status_hint)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(status);

    // Outcomes are always rendered; Prefer only shapes successful resources.
    let body = match (body, prefer) {
        (Some(b), _) if outcome_body => Some(b),
        (Some(_), PreferReturn::Minimal) | (None, _) => None,
        (Some(_), PreferReturn::OperationOutcome) => {
            let (outcome, _) = state
                .settings
                .canned
                .render(Canned::Success, &[status.as_str()]);
            Some(outcome.to_resource().into_value())
        }
        (Some(b), PreferReturn::Representation) => Some(b),
    };

    let Some(body) = body else {
        return without_content_type((status, headers).into_response());
    };

    match state.codec.encode(&body, ctx.format) {
        Ok(bytes) => {
            set_content_type(&mut headers, ctx.format.content_type(ctx.utf8));
            (status, headers, Body::from(bytes)).into_response()
        }
        Err(err) => not_acceptable(state, ctx, err),
    }
}

/// Rendering in the negotiated format failed; answer in JSON instead
fn not_acceptable(state: &AppState, ctx: &RequestContext, err: CodecError) -> Response {
    tracing::warn!(format = ctx.format.name(), error = %err, "Unable to encode response");
    let (outcome, status) = match err {
        CodecError::Unsupported(format) => state
            .settings
            .canned
            .render(Canned::NotAcceptable, &[format.name()]),
        CodecError::Malformed(msg) => state.settings.canned.render(Canned::StoreFailure, &[&msg]),
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::NOT_ACCEPTABLE);
    let mut headers = HeaderMap::new();
    set_content_type(&mut headers, Format::Json.content_type(ctx.utf8));
    match serde_json::to_vec(&outcome) {
        Ok(bytes) => (status, headers, Body::from(bytes)).into_response(),
        Err(_) => without_content_type(status.into_response()),
    }
}

fn set_content_type(headers: &mut HeaderMap, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(v) => {
            headers.insert(header::CONTENT_TYPE, v);
        }
        Err(e) => tracing::warn!(error = %e, "Invalid content type"),
    }
}

/// Bodiless responses must not advertise a content type at all
fn without_content_type(mut response: Response) -> Response {
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}
