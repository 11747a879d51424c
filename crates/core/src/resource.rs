//! Generic resource envelope
//!
//! Resources are owned by the store. This layer only reads a handful of
//! well-known elements and mutates in-memory copies before rendering, so a
//! resource is kept as its JSON object rather than a typed model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::FhirError;

/// A FHIR resource: a JSON object with a string `resourceType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub struct Resource(Map<String, JsonValue>);

impl Resource {
    /// Wrap a JSON value, requiring an object with a string `resourceType`
    pub fn from_value(value: JsonValue) -> Result<Self, FhirError> {
        match value {
            JsonValue::Object(map) => match map.get("resourceType") {
                Some(JsonValue::String(t)) if !t.is_empty() => Ok(Self(map)),
                _ => Err(FhirError::Invalid(
                    "Missing required field: resourceType".to_string(),
                )),
            },
            _ => Err(FhirError::Invalid(
                "Resource must be a JSON object".to_string(),
            )),
        }
    }

    /// Wrap an object already known to carry `resourceType`
    pub(crate) fn from_object(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }

    pub fn resource_type(&self) -> &str {
        self.0
            .get("resourceType")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(JsonValue::as_str)
    }

    pub fn is_outcome(&self) -> bool {
        self.resource_type() == "OperationOutcome"
    }

    pub fn meta(&self) -> Option<&Map<String, JsonValue>> {
        self.0.get("meta").and_then(JsonValue::as_object)
    }

    /// `meta.versionId`, accepting numeric ids as some stores emit them
    pub fn version_id(&self) -> Option<String> {
        match self.meta()?.get("versionId")? {
            JsonValue::String(v) => Some(v.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let raw = self.meta()?.get("lastUpdated")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn get(&self, element: &str) -> Option<&JsonValue> {
        self.0.get(element)
    }

    pub fn insert(&mut self, element: &str, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(element.to_string(), value)
    }

    pub fn remove(&mut self, element: &str) -> Option<JsonValue> {
        self.0.remove(element)
    }

    /// Keep only the top-level elements for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.0.retain(|k, _| keep(k));
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Append a coding to `meta.security`, creating `meta` and the list if absent
    pub fn add_security_label(&mut self, coding: JsonValue) {
        let meta = self
            .0
            .entry("meta")
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !meta.is_object() {
            *meta = JsonValue::Object(Map::new());
        }
        if let Some(meta) = meta.as_object_mut() {
            let security = meta
                .entry("security")
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            if !security.is_array() {
                *security = JsonValue::Array(Vec::new());
            }
            if let Some(list) = security.as_array_mut() {
                list.push(coding);
            }
        }
    }

    /// Security labels currently on `meta.security`
    pub fn security_labels(&self) -> &[JsonValue] {
        self.meta()
            .and_then(|m| m.get("security"))
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl TryFrom<JsonValue> for Resource {
    type Error = FhirError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Resource> for JsonValue {
    fn from(resource: Resource) -> Self {
        resource.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_values_without_resource_type() {
        assert!(Resource::from_value(json!({"id": "1"})).is_err());
        assert!(Resource::from_value(json!([1, 2])).is_err());
        assert!(Resource::from_value(json!({"resourceType": ""})).is_err());
    }

    #[test]
    fn reads_meta_fields() {
        let r = Resource::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "meta": {"versionId": 3, "lastUpdated": "2024-01-02T03:04:05Z"}
        }))
        .unwrap();

        assert_eq!(r.resource_type(), "Patient");
        assert_eq!(r.id(), Some("p1"));
        assert_eq!(r.version_id().as_deref(), Some("3"));
        assert_eq!(
            r.last_updated().unwrap().to_rfc3339(),
            "2024-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn security_label_creates_meta() {
        let mut r = Resource::from_value(json!({"resourceType": "Patient"})).unwrap();
        r.add_security_label(json!({"code": "X"}));
        r.add_security_label(json!({"code": "Y"}));
        assert_eq!(r.security_labels().len(), 2);
        assert_eq!(r.get("meta").unwrap()["security"][1]["code"], "Y");
    }
}
