use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value as JsonValue};

/// FHIR Bundle types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Searchset,
    History,
    Collection,
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
}

/// FHIR Bundle resource as returned by the store.
///
/// Elements this layer does not interpret are kept in `extra` so the bundle
/// renders back out unchanged apart from the enrichment applied here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(deserialize_with = "bundle_tag")]
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Only objects tagged `"resourceType": "Bundle"` deserialize as bundles
fn bundle_tag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = String::deserialize(deserializer)?;
    if tag != "Bundle" {
        return Err(de::Error::custom(format!(
            "expected resourceType Bundle, found {}",
            tag
        )));
    }
    Ok(tag)
}

/// Bundle link (self, next, previous, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

/// Bundle entry. `resource` is absent for history tombstones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<JsonValue>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl BundleEntry {
    pub fn new(full_url: Option<String>, resource: JsonValue) -> Self {
        Self {
            full_url,
            link: Vec::new(),
            resource: Some(resource),
            extra: Map::new(),
        }
    }

    /// Entry for a deleted version in a history bundle
    pub fn tombstone() -> Self {
        Self {
            full_url: None,
            link: Vec::new(),
            resource: None,
            extra: Map::new(),
        }
    }

    /// `(resourceType, id)` of the carried resource, if both are present
    pub fn resource_key(&self) -> Option<(&str, &str)> {
        let resource = self.resource.as_ref()?;
        let resource_type = resource.get("resourceType")?.as_str()?;
        let id = resource.get("id")?.as_str()?;
        Some((resource_type, id))
    }
}

impl Bundle {
    fn with_type(bundle_type: BundleType, total: Option<u32>, entry: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type,
            total,
            link: Vec::new(),
            entry,
            extra: Map::new(),
        }
    }

    pub fn searchset(total: u32, entry: Vec<BundleEntry>) -> Self {
        Self::with_type(BundleType::Searchset, Some(total), entry)
    }

    pub fn history(entry: Vec<BundleEntry>) -> Self {
        let total = u32::try_from(entry.len()).ok();
        Self::with_type(BundleType::History, total, entry)
    }

    /// Number of matches: `total` when the store reports it, else the entries
    /// that actually carry a resource
    pub fn match_count(&self) -> usize {
        match self.total {
            Some(total) => total as usize,
            None => self.entry.iter().filter(|e| e.resource.is_some()).count(),
        }
    }

    /// `(resourceType, id)` of every matched resource, in entry order
    pub fn matched_keys(&self) -> Vec<(String, String)> {
        self.entry
            .iter()
            .filter_map(BundleEntry::resource_key)
            .map(|(t, id)| (t.to_string(), id.to_string()))
            .collect()
    }

    /// Set `fullUrl = <base>/<type>/<id>` on every entry that carries a resource.
    /// Tombstones keep whatever they had.
    pub fn enrich_full_urls(&mut self, base_url: &str) {
        let base = base_url.trim_end_matches('/');
        for entry in &mut self.entry {
            let Some((resource_type, id)) = entry.resource_key() else {
                continue;
            };
            let url = format!("{}/{}/{}", base, resource_type, id);
            entry.full_url = Some(url);
        }
    }
}
