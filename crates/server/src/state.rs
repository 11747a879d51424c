//! Shared application state

use std::sync::Arc;

use fhir_facade_core::{
    CannedResponses, CannedStatuses, CapabilityOptions, KnownResources, SchemaLookup,
};

use crate::codec::Codec;
use crate::config::Config;
use crate::db::Store;

/// Process-wide settings, built once at startup and never mutated
#[derive(Debug, Clone)]
pub struct Settings {
    pub known: KnownResources,
    pub canned: CannedResponses,
    pub capability: CapabilityOptions,
    pub multiple_delete: bool,
    pub max_conditional_delete: usize,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            known: KnownResources::new(config.known_resources.iter().cloned()),
            canned: CannedResponses::new(CannedStatuses {
                nothing_to_delete: config.conditional_delete_missing_status,
                deleted_many: config.conditional_delete_multiple_status,
            }),
            capability: CapabilityOptions {
                status: config.capability_status.clone(),
                experimental: config.capability_experimental,
                multiple_delete: config.conditional_delete_multiple,
            },
            multiple_delete: config.conditional_delete_multiple,
            max_conditional_delete: config.conditional_delete_max.max(1),
        }
    }
}

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub codec: Arc<dyn Codec>,
    pub schema: Arc<dyn SchemaLookup>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<dyn Codec>,
        schema: Arc<dyn SchemaLookup>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            codec,
            schema,
            settings: Arc::new(settings),
        }
    }
}
