use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::registry::KnownResources;
use crate::search_param::{SearchParamType, SearchParameter};

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    pub status: String,
    pub experimental: bool,
    pub date: String,
    pub kind: String,
    pub fhir_version: String,
    pub format: Vec<String>,
    pub rest: Vec<CapabilityRest>,
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    pub resource: Vec<CapabilityResource>,
}

/// Interaction supported on a resource type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interaction {
    pub code: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionalDeleteStatus {
    NotSupported,
    #[default]
    Single,
    Multiple,
}

/// Search parameter advertised on a resource type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilitySearchParam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(rename = "type")]
    pub param_type: SearchParamType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifier: Vec<String>,
}

/// Per resource-type capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub interaction: Vec<Interaction>,
    pub versioning: String,
    pub read_history: bool,
    pub update_create: bool,
    pub conditional_create: bool,
    pub conditional_update: bool,
    pub conditional_delete: ConditionalDeleteStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_param: Vec<CapabilitySearchParam>,
}

impl CapabilityResource {
    pub fn new(resource_type: &str) -> Self {
        let interaction = [
            "read",
            "vread",
            "update",
            "delete",
            "history-instance",
            "create",
            "search-type",
        ]
        .into_iter()
        .map(|code| Interaction {
            code: code.to_string(),
        })
        .collect();

        Self {
            resource_type: resource_type.to_string(),
            interaction,
            versioning: "versioned".to_string(),
            read_history: true,
            update_create: true,
            conditional_create: false,
            conditional_update: false,
            conditional_delete: ConditionalDeleteStatus::NotSupported,
            search_param: Vec::new(),
        }
    }
}

/// Deployment facts stamped onto the statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOptions {
    pub status: String,
    pub experimental: bool,
    pub multiple_delete: bool,
}

impl Default for CapabilityOptions {
    fn default() -> Self {
        Self {
            status: "active".to_string(),
            experimental: false,
            multiple_delete: false,
        }
    }
}

impl CapabilityStatement {
    /// Base statement declaring one entry per known resource type
    pub fn new(known: &KnownResources) -> Self {
        Self {
            resource_type: "CapabilityStatement".to_string(),
            status: "active".to_string(),
            experimental: false,
            date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            kind: "instance".to_string(),
            fhir_version: "4.0.1".to_string(),
            format: vec!["json".to_string()],
            rest: vec![CapabilityRest {
                mode: "server".to_string(),
                resource: known.iter().map(CapabilityResource::new).collect(),
            }],
        }
    }

    /// Merge search parameters into their resource entries and stamp the
    /// deployment facts. Parameters whose base is not declared are ignored.
    pub fn augment(mut self, params: &[SearchParameter], options: &CapabilityOptions) -> Self {
        self.format = vec!["xml".to_string(), "json".to_string()];
        self.status = options.status.clone();
        self.experimental = options.experimental;

        let conditional_delete = if options.multiple_delete {
            ConditionalDeleteStatus::Multiple
        } else {
            ConditionalDeleteStatus::Single
        };

        let Some(rest) = self.rest.first_mut() else {
            return self;
        };

        let mut by_type: HashMap<String, &mut CapabilityResource> = rest
            .resource
            .iter_mut()
            .map(|r| (r.resource_type.clone(), r))
            .collect();

        for entry in by_type.values_mut() {
            entry.conditional_create = true;
            entry.conditional_update = true;
            entry.conditional_delete = conditional_delete;
        }

        for param in params {
            for base in &param.base {
                let Some(entry) = by_type.get_mut(base.as_str()) else {
                    continue;
                };
                entry.search_param.push(CapabilitySearchParam {
                    name: param.name.clone(),
                    definition: param.url.clone(),
                    param_type: param.param_type,
                    target: param.target.clone(),
                    modifier: param
                        .param_type
                        .modifiers()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                });
            }
        }

        self
    }

    pub fn resource(&self, resource_type: &str) -> Option<&CapabilityResource> {
        self.rest
            .first()?
            .resource
            .iter()
            .find(|r| r.resource_type == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, t: SearchParamType, base: &[&str]) -> SearchParameter {
        SearchParameter {
            name: name.to_string(),
            url: Some(format!("http://hl7.org/fhir/SearchParameter/{}", name)),
            param_type: t,
            base: base.iter().map(|b| b.to_string()).collect(),
            target: Vec::new(),
        }
    }

    #[test]
    fn augments_known_types_only() {
        let known = KnownResources::new(["Patient", "Observation"]);
        let params = vec![
            param("family", SearchParamType::String, &["Patient"]),
            param("code", SearchParamType::Token, &["Observation", "Condition"]),
            param("code-value", SearchParamType::Composite, &["Observation"]),
            param("url", SearchParamType::Uri, &["Patient"]),
        ];
        let options = CapabilityOptions {
            status: "draft".to_string(),
            experimental: true,
            multiple_delete: true,
        };

        let cs = CapabilityStatement::new(&known).augment(&params, &options);

        assert_eq!(cs.format, ["xml", "json"]);
        assert_eq!(cs.status, "draft");
        assert!(cs.experimental);

        let patient = cs.resource("Patient").unwrap();
        assert!(patient.conditional_create && patient.conditional_update);
        assert_eq!(patient.conditional_delete, ConditionalDeleteStatus::Multiple);
        assert_eq!(patient.search_param.len(), 2);
        assert_eq!(patient.search_param[0].modifier, ["missing", "exact", "contains"]);
        assert_eq!(patient.search_param[1].modifier, ["missing", "below"]);

        let obs = cs.resource("Observation").unwrap();
        assert_eq!(obs.search_param.len(), 2);
        assert!(obs.search_param[1].modifier.is_empty());
        assert!(cs.resource("Condition").is_none());
    }

    #[test]
    fn single_delete_serializes_lowercase() {
        let known = KnownResources::new(["Patient"]);
        let cs = CapabilityStatement::new(&known).augment(&[], &CapabilityOptions::default());
        let value = serde_json::to_value(&cs).unwrap();

        assert_eq!(value["rest"][0]["resource"][0]["conditionalDelete"], "single");
        assert_eq!(value["rest"][0]["resource"][0]["type"], "Patient");
        assert!(value["rest"][0]["resource"][0].get("searchParam").is_none());
    }
}
