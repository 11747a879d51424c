//! Server configuration

use fhir_facade_core::registry::DEFAULT_RESOURCE_TYPES;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    /// Resource types this deployment accepts
    pub known_resources: Vec<String>,
    /// Allow conditional delete to remove more than one match
    pub conditional_delete_multiple: bool,
    /// Upper bound on matches considered by a conditional delete
    pub conditional_delete_max: usize,
    pub conditional_delete_missing_status: u16,
    pub conditional_delete_multiple_status: u16,
    pub capability_status: String,
    pub capability_experimental: bool,
    /// JSON file of element minimum cardinalities used by `_summary=text`
    pub schema_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "host=localhost user=postgres dbname=fhir".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            cors_origins: vec!["*".to_string()],
            known_resources: DEFAULT_RESOURCE_TYPES.iter().map(|t| t.to_string()).collect(),
            conditional_delete_multiple: false,
            conditional_delete_max: 100,
            conditional_delete_missing_status: 404,
            conditional_delete_multiple_status: 200,
            capability_status: "active".to_string(),
            capability_experimental: false,
            schema_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            cors_origins: env_list("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
            known_resources: env_list("KNOWN_RESOURCES").unwrap_or(defaults.known_resources),
            conditional_delete_multiple: env_parse("CONDITIONAL_DELETE_MULTIPLE")
                .unwrap_or(defaults.conditional_delete_multiple),
            conditional_delete_max: env_parse("CONDITIONAL_DELETE_MAX")
                .unwrap_or(defaults.conditional_delete_max),
            conditional_delete_missing_status: env_parse("CONDITIONAL_DELETE_MISSING_STATUS")
                .unwrap_or(defaults.conditional_delete_missing_status),
            conditional_delete_multiple_status: env_parse("CONDITIONAL_DELETE_MULTIPLE_STATUS")
                .unwrap_or(defaults.conditional_delete_multiple_status),
            capability_status: std::env::var("CAPABILITY_STATUS")
                .unwrap_or(defaults.capability_status),
            capability_experimental: env_parse("CAPABILITY_EXPERIMENTAL")
                .unwrap_or(defaults.capability_experimental),
            schema_path: std::env::var("SCHEMA_PATH").ok(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
