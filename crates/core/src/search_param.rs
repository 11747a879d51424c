//! SearchParameter descriptions as listed by the store

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    String,
    Token,
    Date,
    Number,
    Reference,
    Composite,
    Quantity,
    Uri,
    Special,
}

impl SearchParamType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(Self::String),
            "token" => Some(Self::Token),
            "date" => Some(Self::Date),
            "number" => Some(Self::Number),
            "reference" => Some(Self::Reference),
            "composite" => Some(Self::Composite),
            "quantity" => Some(Self::Quantity),
            "uri" => Some(Self::Uri),
            "special" => Some(Self::Special),
            _ => None,
        }
    }

    /// Search modifiers advertised for this type
    pub fn modifiers(self) -> Vec<&'static str> {
        match self {
            Self::Composite => vec![],
            Self::String => vec!["missing", "exact", "contains"],
            Self::Uri => vec!["missing", "below"],
            _ => vec!["missing"],
        }
    }
}

/// One queryable field of one or more resource types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameter {
    pub name: String,
    pub url: Option<String>,
    pub param_type: SearchParamType,
    pub base: Vec<String>,
    pub target: Vec<String>,
}

impl SearchParameter {
    /// Read a SearchParameter resource. The query name is `code`, falling back
    /// to `name`. Parameters of an unknown type are skipped.
    pub fn from_resource(value: &JsonValue) -> Option<Self> {
        let name = value
            .get("code")
            .or_else(|| value.get("name"))
            .and_then(JsonValue::as_str)?
            .to_string();
        let param_type = value
            .get("type")
            .and_then(JsonValue::as_str)
            .and_then(SearchParamType::parse)?;

        Some(Self {
            name,
            url: value.get("url").and_then(JsonValue::as_str).map(str::to_string),
            param_type,
            base: string_list(value.get("base")),
            target: string_list(value.get("target")),
        })
    }
}

/// `base` is `0..*` in R4 but a single code in older stores
fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::String(s)) => vec![s.clone()],
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn modifiers_by_type() {
        assert_eq!(SearchParamType::String.modifiers(), ["missing", "exact", "contains"]);
        assert_eq!(SearchParamType::Uri.modifiers(), ["missing", "below"]);
        assert_eq!(SearchParamType::Token.modifiers(), ["missing"]);
        assert!(SearchParamType::Composite.modifiers().is_empty());
    }

    #[test]
    fn parses_search_parameter_resources() {
        let sp = SearchParameter::from_resource(&json!({
            "resourceType": "SearchParameter",
            "name": "PatientOrganization",
            "code": "organization",
            "url": "http://hl7.org/fhir/SearchParameter/Patient-organization",
            "type": "reference",
            "base": ["Patient"],
            "target": ["Organization"]
        }))
        .unwrap();

        assert_eq!(sp.name, "organization");
        assert_eq!(sp.param_type, SearchParamType::Reference);
        assert_eq!(sp.base, ["Patient"]);
        assert_eq!(sp.target, ["Organization"]);

        let legacy = SearchParameter::from_resource(&json!({
            "name": "family", "type": "string", "base": "Patient"
        }))
        .unwrap();
        assert_eq!(legacy.base, ["Patient"]);
        assert!(SearchParameter::from_resource(&json!({"name": "x", "type": "weird"})).is_none());
    }
}
