//! Resource store seam
//!
//! The store owns persistence, versioning and search. Every call is a single
//! remote operation; domain errors come back as OperationOutcome replies
//! while transport failures come back as `AppError`.

use async_trait::async_trait;
use fhir_facade_core::{Bundle, Resource, StoreReply};

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Raw `If-None-Exist` criteria, forwarded as-is
    pub if_none_exist: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Expected current version id parsed from `If-Match`
    pub if_match: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create(
        &self,
        resource_type: &str,
        body: &Resource,
        opts: &CreateOptions,
    ) -> Result<StoreReply, AppError>;

    async fn read(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError>;

    async fn vread(
        &self,
        resource_type: &str,
        id: &str,
        version_id: &str,
    ) -> Result<StoreReply, AppError>;

    async fn update(
        &self,
        resource_type: &str,
        id: &str,
        body: &Resource,
        opts: &UpdateOptions,
    ) -> Result<StoreReply, AppError>;

    async fn delete(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError>;

    /// Search with a raw, already encoded query string
    async fn search(&self, resource_type: &str, query: &str) -> Result<Bundle, AppError>;

    async fn history(&self, resource_type: &str, id: &str) -> Result<Bundle, AppError>;

    /// Every SearchParameter the store supports
    async fn search_parameters(&self) -> Result<Bundle, AppError>;

    /// Version id of the most recent (deletion) version of a resource
    async fn deleted_version(&self, resource_type: &str, id: &str)
    -> Result<Option<String>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
