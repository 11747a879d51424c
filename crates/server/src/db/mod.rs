mod repository;
mod store;

pub use repository::PgStore;
pub use store::{CreateOptions, Store, UpdateOptions};

use deadpool_postgres::{Config, Pool, Runtime};
use fhir_facade_core::{Bundle, StoreReply};
use serde_json::Value as JsonValue;
use tokio_postgres::NoTls;

use crate::error::AppError;

/// Status for a store outcome that carries no hint of its own
const UNHINTED_STORE_STATUS: u16 = 400;

/// Create a connection pool from a database URL
pub async fn create_pool(database_url: &str) -> Result<Pool, deadpool_postgres::CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}

/// Interpret a store answer to a Bundle-returning call. An OperationOutcome
/// in its place is passed on with the store's suggested status.
pub fn bundle_reply(value: JsonValue) -> Result<Bundle, AppError> {
    let is_outcome =
        value.get("resourceType").and_then(JsonValue::as_str) == Some("OperationOutcome");
    if !is_outcome {
        return Ok(serde_json::from_value(value)?);
    }
    let reply = StoreReply::from_value(value)?;
    let status = reply.status().unwrap_or(UNHINTED_STORE_STATUS);
    Err(AppError::Store {
        outcome: reply.into_resource(),
        status,
    })
}
