//! Element definition lookup used by `_summary=text`

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::FhirError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ElementDefinition {
    #[serde(default)]
    pub min: u32,
}

/// External schema-definition lookup
pub trait SchemaLookup: Send + Sync {
    fn element_definition(&self, resource_type: &str, element: &str) -> Option<ElementDefinition>;

    /// Element has minimum cardinality of at least one
    fn is_mandatory(&self, resource_type: &str, element: &str) -> bool {
        self.element_definition(resource_type, element)
            .is_some_and(|def| def.min >= 1)
    }
}

/// Static table of element definitions keyed by resource type then element name.
///
/// Loaded from JSON shaped as
/// `{"Observation": {"status": {"min": 1}, "code": {"min": 1}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ElementTable {
    types: HashMap<String, HashMap<String, ElementDefinition>>,
}

impl ElementTable {
    pub fn from_json(raw: &str) -> Result<Self, FhirError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl SchemaLookup for ElementTable {
    fn element_definition(&self, resource_type: &str, element: &str) -> Option<ElementDefinition> {
        self.types.get(resource_type)?.get(element).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_elements_from_json() {
        let table = ElementTable::from_json(
            r#"{"Observation": {"status": {"min": 1}, "note": {"min": 0}}}"#,
        )
        .unwrap();

        assert!(table.is_mandatory("Observation", "status"));
        assert!(!table.is_mandatory("Observation", "note"));
        assert!(!table.is_mandatory("Observation", "missing"));
        assert!(!table.is_mandatory("Patient", "status"));
        assert!(ElementTable::from_json("[1]").is_err());
    }
}
