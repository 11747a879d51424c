//! `_summary` projections that need no store access

use serde_json::json;

use crate::resource::Resource;
use crate::schema::SchemaLookup;

pub const SUBSETTED_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ObservationValue";
pub const SUBSETTED_CODE: &str = "SUBSETTED";

/// Elements `_summary=text` always keeps
const TEXT_MODE_ELEMENTS: &[&str] = &["resourceType", "meta", "id", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryMode {
    True,
    Text,
    Data,
    #[default]
    False,
}

impl SummaryMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "true" => Some(Self::True),
            "text" => Some(Self::Text),
            "data" => Some(Self::Data),
            "false" => Some(Self::False),
            _ => None,
        }
    }

    pub fn requires_projection(self) -> bool {
        !matches!(self, Self::False)
    }
}

/// `_summary=data`: drop the narrative
pub fn strip_text(resource: &mut Resource) {
    resource.remove("text");
}

/// `_summary=text`: keep the narrative, identity, meta and mandatory elements
pub fn retain_text(resource: &mut Resource, schema: &dyn SchemaLookup) {
    let resource_type = resource.resource_type().to_string();
    resource.retain(|element| {
        TEXT_MODE_ELEMENTS.contains(&element) || schema.is_mandatory(&resource_type, element)
    });
}

/// Tag a projected resource with exactly one SUBSETTED security label
pub fn mark_subsetted(resource: &mut Resource) {
    let already = resource.security_labels().iter().any(|label| {
        label.get("code").and_then(|c| c.as_str()) == Some(SUBSETTED_CODE)
            && label.get("system").and_then(|s| s.as_str()) == Some(SUBSETTED_SYSTEM)
    });
    if !already {
        resource.add_security_label(json!({
            "system": SUBSETTED_SYSTEM,
            "code": SUBSETTED_CODE,
            "display": "subsetted"
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ElementTable;
    use serde_json::json;

    fn observation() -> Resource {
        Resource::from_value(json!({
            "resourceType": "Observation",
            "id": "o1",
            "meta": {"versionId": "2"},
            "text": {"status": "generated", "div": "<div/>"},
            "status": "final",
            "code": {"text": "Heart rate"},
            "note": [{"text": "resting"}]
        }))
        .unwrap()
    }

    #[test]
    fn data_mode_drops_text_only() {
        let mut r = observation();
        strip_text(&mut r);
        mark_subsetted(&mut r);

        assert!(r.get("text").is_none());
        assert_eq!(r.id(), Some("o1"));
        assert_eq!(r.resource_type(), "Observation");
        assert!(r.get("note").is_some());
        assert_eq!(r.security_labels().len(), 1);
    }

    #[test]
    fn text_mode_keeps_mandatory_elements() {
        let schema = ElementTable::from_json(
            r#"{"Observation": {"status": {"min": 1}, "code": {"min": 1}, "note": {"min": 0}}}"#,
        )
        .unwrap();
        let mut r = observation();
        retain_text(&mut r, &schema);

        let mut kept: Vec<_> = r.elements().collect();
        kept.sort_unstable();
        assert_eq!(kept, ["code", "id", "meta", "resourceType", "status", "text"]);
    }

    #[test]
    fn subsetted_is_added_once() {
        let mut r = observation();
        mark_subsetted(&mut r);
        mark_subsetted(&mut r);
        assert_eq!(r.security_labels().len(), 1);
        assert_eq!(r.security_labels()[0]["code"], SUBSETTED_CODE);
    }

    #[test]
    fn parses_modes() {
        assert_eq!(SummaryMode::parse("TEXT"), Some(SummaryMode::Text));
        assert_eq!(SummaryMode::parse("count"), None);
        assert!(!SummaryMode::False.requires_projection());
        assert!(SummaryMode::Data.requires_projection());
    }
}
