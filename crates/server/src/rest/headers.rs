//! FHIR HTTP header handling
//!
//! Request headers: `If-Match`, `If-None-Exist`, `Prefer`.
//! Response headers: `ETag`, `Last-Modified`, `Location`.

use axum::http::{HeaderMap, HeaderValue, Uri, header};
use chrono::{DateTime, Utc};
use fhir_facade_core::Resource;

/// Prefer header return preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreferReturn {
    Minimal,
    #[default]
    Representation,
    OperationOutcome,
}

/// Extract the `return=` preference from a Prefer header
pub fn parse_prefer(raw: Option<&str>) -> PreferReturn {
    let Some(raw) = raw else {
        return PreferReturn::default();
    };
    raw.split([',', ';'])
        .filter_map(|part| part.trim().strip_prefix("return="))
        .find_map(|value| match value.trim_matches('"') {
            "minimal" => Some(PreferReturn::Minimal),
            "representation" => Some(PreferReturn::Representation),
            "OperationOutcome" => Some(PreferReturn::OperationOutcome),
            _ => None,
        })
        .unwrap_or_default()
}

/// Strip weak-ETag quoting from an `If-Match` value: `W/"3"` becomes `3`
pub fn parse_if_match(raw: &str) -> Option<String> {
    let value = raw.trim();
    let value = value.strip_prefix("W/").unwrap_or(value);
    let value = value.trim_matches('"').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Format a version id as a weak ETag
pub fn format_etag(version_id: &str) -> String {
    format!("W/\"{}\"", version_id)
}

/// Format an instant as an HTTP-date
pub fn http_date(instant: &DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Rebuild `scheme://host[:port]` from the inbound request, dropping the
/// port when it is the scheme's default
pub fn base_url(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = uri
        .scheme_str()
        .or_else(|| header_str(headers, "x-forwarded-proto"))
        .unwrap_or("http")
        .to_ascii_lowercase();

    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| header_str(headers, header::HOST.as_str()))
        .unwrap_or("localhost");

    let (host, port) = split_host_port(authority);
    let default_port = match scheme.as_str() {
        "https" => 443,
        _ => 80,
    };

    match port {
        Some(port) if port != default_port => format!("{}://{}:{}", scheme, host, port),
        _ => format!("{}://{}", scheme, host),
    }
}

fn split_host_port(authority: &str) -> (&str, Option<u16>) {
    // bracketed IPv6 literals contain colons of their own
    let port_sep = match authority.rfind(']') {
        Some(end) => authority[end..].rfind(':').map(|i| i + end),
        None => authority.rfind(':'),
    };
    match port_sep {
        Some(i) => match authority[i + 1..].parse::<u16>() {
            Ok(port) => (&authority[..i], Some(port)),
            Err(_) => (authority, None),
        },
        None => (authority, None),
    }
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Versioning headers derived from a resource's `meta`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionHeaders {
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub location: Option<String>,
}

impl VersionHeaders {
    /// Only genuine resources carry meta; outcomes yield no headers
    pub fn derive(resource: &Resource, base_url: &str) -> Self {
        if resource.is_outcome() || resource.meta().is_none() {
            return Self::default();
        }
        let version_id = resource.version_id();
        let location = match (resource.id(), version_id.as_deref()) {
            (Some(id), Some(vid)) => Some(format!(
                "{}/{}/{}/_history/{}",
                base_url.trim_end_matches('/'),
                resource.resource_type(),
                id,
                vid
            )),
            _ => None,
        };

        Self {
            last_modified: resource.last_updated().as_ref().map(http_date),
            etag: version_id.as_deref().map(format_etag),
            location,
        }
    }

    pub fn etag_only(version_id: &str) -> Self {
        Self {
            etag: Some(format_etag(version_id)),
            ..Self::default()
        }
    }

    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }

    /// Write the present values into `headers`; absent values are not emitted
    pub fn apply(&self, headers: &mut HeaderMap) {
        let pairs = [
            (header::LAST_MODIFIED, &self.last_modified),
            (header::ETAG, &self.etag),
            (header::LOCATION, &self.location),
        ];
        for (name, value) in pairs {
            let Some(value) = value else { continue };
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    headers.insert(name, v);
                }
                Err(e) => tracing::warn!(header = %name, error = %e, "Skipping unencodable header"),
            }
        }
    }
}
