use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::resource::Resource;

/// Extension carried on an issue to suggest the HTTP status of the response
pub const HTTP_STATUS_EXTENSION: &str =
    "http://hl7.org/fhir/StructureDefinition/operationoutcome-http-status";

/// Severity of the issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Type of issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    Invariant,
    Security,
    Login,
    Unknown,
    Expired,
    Forbidden,
    Suppressed,
    Processing,
    NotSupported,
    Duplicate,
    MultipleMatches,
    NotFound,
    Deleted,
    TooLong,
    CodeInvalid,
    Extension,
    TooCostly,
    BusinessRule,
    Conflict,
    Incomplete,
    Transient,
    LockError,
    NoStore,
    Exception,
    Timeout,
    Throttled,
    Informational,
}

/// Human readable issue details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueDetails {
    pub text: String,
}

/// Extension on an issue; only the value types used for status hints are modelled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

impl Extension {
    pub fn http_status(status: u16) -> Self {
        Self {
            url: HTTP_STATUS_EXTENSION.to_string(),
            value_integer: Some(i64::from(status)),
            value_code: None,
            value_string: None,
        }
    }

    fn as_status(&self) -> Option<u16> {
        if self.url != HTTP_STATUS_EXTENSION {
            return None;
        }
        self.value_integer
            .and_then(|v| u16::try_from(v).ok())
            .or_else(|| self.value_code.as_deref().and_then(parse_status))
            .or_else(|| self.value_string.as_deref().and_then(parse_status))
    }
}

/// A single issue within an OperationOutcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<IssueDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// FHIR OperationOutcome resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    pub fn new(severity: IssueSeverity, code: IssueType, message: &str) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                details: None,
                diagnostics: Some(message.to_string()),
                extension: Vec::new(),
            }],
        }
    }

    pub fn error(code: IssueType, message: &str) -> Self {
        Self::new(IssueSeverity::Error, code, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::error(IssueType::NotFound, message)
    }

    pub fn success(message: &str) -> Self {
        Self::new(IssueSeverity::Information, IssueType::Informational, message)
    }

    /// Attach a suggested HTTP status to the first issue
    pub fn with_status(mut self, status: u16) -> Self {
        if let Some(issue) = self.issue.first_mut() {
            issue.extension.retain(|e| e.url != HTTP_STATUS_EXTENSION);
            issue.extension.push(Extension::http_status(status));
        }
        self
    }

    /// The first status hint found on any issue
    pub fn status_hint(&self) -> Option<u16> {
        self.issue
            .iter()
            .flat_map(|i| i.extension.iter())
            .find_map(Extension::as_status)
    }

    pub fn diagnostics(&self) -> Option<&str> {
        self.issue.first().and_then(|i| i.diagnostics.as_deref())
    }

    pub fn to_resource(&self) -> Resource {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => Resource::from_object(map),
            _ => Resource::from_object(serde_json::Map::from_iter([(
                "resourceType".to_string(),
                JsonValue::String("OperationOutcome".to_string()),
            )])),
        }
    }
}

/// Read a status hint straight from an untyped OperationOutcome.
///
/// Store replies are not guaranteed to match the typed model above, so the
/// hint is located by walking `issue[].extension[]` directly.
pub fn status_hint(value: &JsonValue) -> Option<u16> {
    value
        .get("issue")?
        .as_array()?
        .iter()
        .filter_map(|issue| issue.get("extension").and_then(JsonValue::as_array))
        .flatten()
        .find_map(|ext| {
            if ext.get("url").and_then(JsonValue::as_str) != Some(HTTP_STATUS_EXTENSION) {
                return None;
            }
            if let Some(n) = ext.get("valueInteger").and_then(JsonValue::as_u64) {
                return u16::try_from(n).ok();
            }
            ext.get("valueCode")
                .or_else(|| ext.get("valueString"))
                .and_then(JsonValue::as_str)
                .and_then(parse_status)
        })
}

/// Remove every status hint extension from an untyped OperationOutcome
pub fn strip_status_hint(value: &mut JsonValue) {
    let Some(issues) = value.get_mut("issue").and_then(JsonValue::as_array_mut) else {
        return;
    };
    for issue in issues {
        if let Some(exts) = issue.get_mut("extension").and_then(JsonValue::as_array_mut) {
            exts.retain(|ext| {
                ext.get("url").and_then(JsonValue::as_str) != Some(HTTP_STATUS_EXTENSION)
            });
        }
    }
}

fn parse_status(raw: &str) -> Option<u16> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|s| (100..=599).contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_status_hint_round_trips_through_json() {
        let outcome = OperationOutcome::not_found("gone").with_status(410);
        assert_eq!(outcome.status_hint(), Some(410));

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(status_hint(&value), Some(410));
        assert_eq!(value["issue"][0]["extension"][0]["valueInteger"], 410);
    }

    #[test]
    fn string_and_code_hints_are_accepted() {
        let by_code = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "not-found",
                "extension": [{"url": HTTP_STATUS_EXTENSION, "valueCode": "404"}]}]
        });
        let by_string = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "conflict"},
                {"severity": "error", "code": "conflict",
                 "extension": [{"url": HTTP_STATUS_EXTENSION, "valueString": " 412 "}]}]
        });
        assert_eq!(status_hint(&by_code), Some(404));
        assert_eq!(status_hint(&by_string), Some(412));
    }

    #[test]
    fn unrelated_extensions_are_ignored() {
        let value = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "processing",
                "extension": [{"url": "http://example.org/other", "valueInteger": 500}]}]
        });
        assert_eq!(status_hint(&value), None);
    }

    #[test]
    fn strip_removes_only_status_hints() {
        let mut value = json!({
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "deleted",
                "extension": [
                    {"url": HTTP_STATUS_EXTENSION, "valueInteger": 410},
                    {"url": "http://example.org/other", "valueString": "kept"}
                ]}]
        });
        strip_status_hint(&mut value);
        assert_eq!(status_hint(&value), None);
        assert_eq!(value["issue"][0]["extension"][0]["valueString"], "kept");
    }
}
