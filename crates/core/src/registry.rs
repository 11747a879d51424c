//! Known-resource registry
//!
//! The set of resource types a deployment accepts. Built once at startup and
//! only read afterwards.

use std::collections::BTreeSet;

/// Resource types accepted when no explicit list is configured
pub const DEFAULT_RESOURCE_TYPES: &[&str] = &[
    "AllergyIntolerance",
    "Condition",
    "DiagnosticReport",
    "Encounter",
    "Immunization",
    "Location",
    "Medication",
    "MedicationRequest",
    "Observation",
    "Organization",
    "Patient",
    "Practitioner",
    "Procedure",
    "SearchParameter",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownResources {
    types: BTreeSet<String>,
}

impl KnownResources {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.contains(resource_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Comma separated listing used in "unknown resource" outcomes
    pub fn listing(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }
}

impl Default for KnownResources {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_TYPES.iter().copied())
    }
}
