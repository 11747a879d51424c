//! Shared helpers for the HTTP integration tests.
//!
//! `MemoryStore` stands in for the PostgreSQL store: ids are sequential, every
//! write appends a version, and deletes append a tombstone. Search matches a
//! parameter value against any string nested under the top-level element of
//! the same name, which is enough to drive the conditional interactions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use fhir_facade_core::{
    Bundle, BundleEntry, ElementTable, IssueType, OperationOutcome, Resource, StoreReply,
};
use fhir_facade_server::codec::JsonCodec;
use fhir_facade_server::config::Config;
use fhir_facade_server::db::{CreateOptions, Store, UpdateOptions};
use fhir_facade_server::error::AppError;
use fhir_facade_server::state::{AppState, Settings};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;
use url::form_urlencoded;

type Key = (String, String);

/// Underscore parameters the search understands; any other is refused
const SEARCH_CONTROLS: &[&str] = &["_id", "_count", "_summary", "_page"];

#[derive(Default)]
struct Inner {
    next_id: u64,
    /// Every version of every resource; `None` marks a deletion
    versions: BTreeMap<Key, Vec<Option<JsonValue>>>,
    search_parameters: Vec<JsonValue>,
    /// Answer `_summary=true` searches with an empty bundle
    no_summary_search: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn outcome(status: u16, message: &str) -> StoreReply {
    let code = match status {
        404 => IssueType::NotFound,
        410 => IssueType::Deleted,
        _ => IssueType::Conflict,
    };
    let outcome = OperationOutcome::error(code, message).with_status(status);
    StoreReply::Outcome {
        outcome: outcome.to_resource(),
        status: Some(status),
    }
}

fn stamp(mut value: JsonValue, resource_type: &str, id: &str, version: usize) -> JsonValue {
    value["resourceType"] = json!(resource_type);
    value["id"] = json!(id);
    value["meta"] = json!({
        "versionId": version.to_string(),
        "lastUpdated": "2024-03-01T12:30:00Z",
    });
    value
}

fn mentions(value: &JsonValue, needle: &str) -> bool {
    match value {
        JsonValue::String(s) => s == needle,
        JsonValue::Array(items) => items.iter().any(|v| mentions(v, needle)),
        JsonValue::Object(map) => map.values().any(|v| mentions(v, needle)),
        _ => false,
    }
}

/// Store-side `_summary=true` projection
fn store_summary(value: &JsonValue) -> JsonValue {
    let mut summary = serde_json::Map::new();
    if let JsonValue::Object(map) = value {
        for key in ["resourceType", "id", "meta", "identifier", "name"] {
            if let Some(v) = map.get(key) {
                summary.insert(key.to_string(), v.clone());
            }
        }
    }
    JsonValue::Object(summary)
}

impl Inner {
    fn current(&self, resource_type: &str, id: &str) -> Option<&Option<JsonValue>> {
        self.versions
            .get(&(resource_type.to_string(), id.to_string()))
            .and_then(|v| v.last())
    }

    fn write(&mut self, resource_type: &str, id: &str, body: JsonValue) -> JsonValue {
        let versions = self
            .versions
            .entry((resource_type.to_string(), id.to_string()))
            .or_default();
        let value = stamp(body, resource_type, id, versions.len() + 1);
        versions.push(Some(value.clone()));
        value
    }

    fn create(&mut self, resource_type: &str, body: JsonValue) -> JsonValue {
        self.next_id += 1;
        let id = self.next_id.to_string();
        self.write(resource_type, &id, body)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_parameters(self, params: Vec<JsonValue>) -> Self {
        self.inner.lock().unwrap().search_parameters = params;
        self
    }

    pub fn without_summary_search(self) -> Self {
        self.inner.lock().unwrap().no_summary_search = true;
        self
    }

    /// Insert a resource directly and return its id
    pub fn seed(&self, body: JsonValue) -> String {
        let resource_type = body["resourceType"].as_str().unwrap().to_string();
        let value = self.inner.lock().unwrap().create(&resource_type, body);
        value["id"].as_str().unwrap().to_string()
    }

    /// Number of live resources of `resource_type`
    pub fn count(&self, resource_type: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .versions
            .iter()
            .filter(|((t, _), v)| t == resource_type && matches!(v.last(), Some(Some(_))))
            .count()
    }

    pub fn current(&self, resource_type: &str, id: &str) -> Option<JsonValue> {
        self.inner
            .lock()
            .unwrap()
            .current(resource_type, id)
            .cloned()
            .flatten()
    }

    pub fn version_count(&self, resource_type: &str, id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .versions
            .get(&(resource_type.to_string(), id.to_string()))
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(
        &self,
        resource_type: &str,
        body: &Resource,
        _opts: &CreateOptions,
    ) -> Result<StoreReply, AppError> {
        let value = self
            .inner
            .lock()
            .unwrap()
            .create(resource_type, body.as_value());
        Ok(StoreReply::from_value(value)?)
    }

    async fn read(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError> {
        let inner = self.inner.lock().unwrap();
        match inner.current(resource_type, id) {
            None => Ok(outcome(404, &format!("{}/{} not found", resource_type, id))),
            Some(None) => Ok(outcome(410, &format!("{}/{} was deleted", resource_type, id))),
            Some(Some(value)) => Ok(StoreReply::from_value(value.clone())?),
        }
    }

    async fn vread(
        &self,
        resource_type: &str,
        id: &str,
        version_id: &str,
    ) -> Result<StoreReply, AppError> {
        let inner = self.inner.lock().unwrap();
        let version = version_id
            .parse::<usize>()
            .ok()
            .and_then(|v| v.checked_sub(1))
            .and_then(|i| {
                inner
                    .versions
                    .get(&(resource_type.to_string(), id.to_string()))?
                    .get(i)
                    .cloned()
            });
        match version {
            Some(Some(value)) => Ok(StoreReply::from_value(value)?),
            Some(None) => Ok(outcome(410, "version was a deletion")),
            None => Ok(outcome(404, "version not found")),
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        id: &str,
        body: &Resource,
        opts: &UpdateOptions,
    ) -> Result<StoreReply, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(expected) = opts.if_match.as_deref() {
            let current = inner
                .current(resource_type, id)
                .cloned()
                .flatten()
                .and_then(|v| v["meta"]["versionId"].as_str().map(str::to_string));
            if current.as_deref() != Some(expected) {
                return Ok(outcome(412, "version mismatch"));
            }
        }
        let value = inner.write(resource_type, id, body.as_value());
        Ok(StoreReply::from_value(value)?)
    }

    async fn delete(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.current(resource_type, id) {
            None => return Ok(outcome(404, "not found")),
            Some(None) => return Ok(outcome(410, "already deleted")),
            Some(Some(_)) => {}
        }
        if let Some(versions) = inner
            .versions
            .get_mut(&(resource_type.to_string(), id.to_string()))
        {
            versions.push(None);
        }
        Ok(StoreReply::from_value(
            OperationOutcome::success("deleted").to_resource().into_value(),
        )?)
    }

    async fn search(&self, resource_type: &str, query: &str) -> Result<Bundle, AppError> {
        let params: Vec<(String, String)> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        let param = |name: &str| params.iter().find(|(k, _)| k == name).map(|(_, v)| v);
        let count = param("_count").and_then(|c| c.parse::<usize>().ok());
        let summary = param("_summary").is_some_and(|s| s == "true");

        if let Some((name, _)) = params
            .iter()
            .find(|(k, _)| k.starts_with('_') && !SEARCH_CONTROLS.contains(&k.as_str()))
        {
            let refused = OperationOutcome::error(
                IssueType::NotSupported,
                &format!("Unknown search parameter {}", name),
            )
            .with_status(400);
            return fhir_facade_server::db::bundle_reply(serde_json::to_value(refused)?);
        }

        let inner = self.inner.lock().unwrap();
        if summary && inner.no_summary_search {
            return Ok(Bundle::searchset(0, Vec::new()));
        }
        let matches: Vec<JsonValue> = inner
            .versions
            .iter()
            .filter(|((t, _), _)| t == resource_type)
            .filter_map(|(_, versions)| versions.last().cloned().flatten())
            .filter(|value| {
                params.iter().all(|(k, v)| match k.as_str() {
                    "_id" => value["id"] == json!(v),
                    k if k.starts_with('_') => true,
                    k => value.get(k).is_some_and(|element| mentions(element, v)),
                })
            })
            .collect();

        let total = matches.len() as u32;
        let entries = matches
            .into_iter()
            .take(count.unwrap_or(usize::MAX))
            .map(|v| if summary { store_summary(&v) } else { v })
            .map(|v| BundleEntry::new(None, v))
            .collect();
        Ok(Bundle::searchset(total, entries))
    }

    async fn history(&self, resource_type: &str, id: &str) -> Result<Bundle, AppError> {
        let inner = self.inner.lock().unwrap();
        let entries = inner
            .versions
            .get(&(resource_type.to_string(), id.to_string()))
            .map(|versions| {
                versions
                    .iter()
                    .rev()
                    .map(|v| match v {
                        Some(value) => BundleEntry::new(None, value.clone()),
                        None => BundleEntry::tombstone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Bundle::history(entries))
    }

    async fn search_parameters(&self) -> Result<Bundle, AppError> {
        let inner = self.inner.lock().unwrap();
        let entries: Vec<BundleEntry> = inner
            .search_parameters
            .iter()
            .cloned()
            .map(|v| BundleEntry::new(None, v))
            .collect();
        Ok(Bundle::searchset(entries.len() as u32, entries))
    }

    async fn deleted_version(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(Some(self.version_count(resource_type, id))
            .filter(|n| *n > 0)
            .map(|n| n.to_string()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Element table used by `_summary=text` tests: Patient.gender is mandatory
pub const SCHEMA: &str = r#"{"Patient": {"gender": {"min": 1}, "birthDate": {"min": 0}}}"#;

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        bind_address: "0.0.0.0:0".to_string(),
        ..Config::default()
    }
}

/// Build the app router around `store` with `config`.
pub fn test_app_with(store: Arc<MemoryStore>, config: Config) -> Router {
    let schema = ElementTable::from_json(SCHEMA).unwrap();
    let state = AppState::new(
        store,
        Arc::new(JsonCodec),
        Arc::new(schema),
        Settings::from_config(&config),
    );
    fhir_facade_server::build_app(state, &config)
}

pub fn test_app(store: Arc<MemoryStore>) -> Router {
    test_app_with(store, test_config())
}

/// Send a request to the app and return (status, headers, body as JSON).
pub async fn request(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, headers, body)
}

/// Build a GET request.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a POST request with a FHIR JSON body.
pub fn post(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/fhir+json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Build a PUT request with a FHIR JSON body.
pub fn put(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("Content-Type", "application/fhir+json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Build a DELETE request.
pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Sample patient JSON for tests.
pub fn sample_patient(family: &str, identifier: &str, gender: &str) -> JsonValue {
    json!({
        "resourceType": "Patient",
        "identifier": [{"system": "urn:mrn", "value": identifier}],
        "name": [{"family": family}],
        "gender": gender,
        "birthDate": "1990-05-15",
        "text": {"status": "generated", "div": "<div>patient</div>"}
    })
}
