use async_trait::async_trait;
use deadpool_postgres::Pool;
use fhir_facade_core::{Bundle, Resource, StoreReply};
use serde_json::Value as JsonValue;
use tokio_postgres::types::ToSql;

use super::store::{CreateOptions, Store, UpdateOptions};
use crate::error::AppError;

/// Store backed by the FHIR storage functions of a PostgreSQL extension.
///
/// Each resource operation is one `SELECT fhir_*(...)` returning a `jsonb`
/// resource, OperationOutcome or Bundle.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn call(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<JsonValue, AppError> {
        let client = self.pool.get().await?;
        let row = client.query_one(sql, params).await?;
        Ok(row.try_get(0)?)
    }

    async fn reply(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<StoreReply, AppError> {
        let value = self.call(sql, params).await?;
        Ok(StoreReply::from_value(value)?)
    }

    async fn bundle(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Bundle, AppError> {
        let value = self.call(sql, params).await?;
        super::bundle_reply(value)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create(
        &self,
        resource_type: &str,
        body: &Resource,
        opts: &CreateOptions,
    ) -> Result<StoreReply, AppError> {
        let data = body.as_value();
        self.reply(
            "SELECT fhir_create($1, $2::jsonb, $3)",
            &[&resource_type, &data, &opts.if_none_exist],
        )
        .await
    }

    async fn read(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError> {
        self.reply("SELECT fhir_read($1, $2)", &[&resource_type, &id])
            .await
    }

    async fn vread(
        &self,
        resource_type: &str,
        id: &str,
        version_id: &str,
    ) -> Result<StoreReply, AppError> {
        self.reply(
            "SELECT fhir_vread($1, $2, $3)",
            &[&resource_type, &id, &version_id],
        )
        .await
    }

    async fn update(
        &self,
        resource_type: &str,
        id: &str,
        body: &Resource,
        opts: &UpdateOptions,
    ) -> Result<StoreReply, AppError> {
        let data = body.as_value();
        self.reply(
            "SELECT fhir_update($1, $2, $3::jsonb, $4)",
            &[&resource_type, &id, &data, &opts.if_match],
        )
        .await
    }

    async fn delete(&self, resource_type: &str, id: &str) -> Result<StoreReply, AppError> {
        self.reply("SELECT fhir_delete($1, $2)", &[&resource_type, &id])
            .await
    }

    async fn search(&self, resource_type: &str, query: &str) -> Result<Bundle, AppError> {
        self.bundle("SELECT fhir_search($1, $2)", &[&resource_type, &query])
            .await
    }

    async fn history(&self, resource_type: &str, id: &str) -> Result<Bundle, AppError> {
        self.bundle("SELECT fhir_history($1, $2)", &[&resource_type, &id])
            .await
    }

    async fn search_parameters(&self) -> Result<Bundle, AppError> {
        self.bundle("SELECT fhir_search_parameters()", &[]).await
    }

    async fn deleted_version(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Option<String>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT max(version)::text FROM fhir_history
                   WHERE resource_type = $1 AND resource_id::text = $2",
                &[&resource_type, &id],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}
