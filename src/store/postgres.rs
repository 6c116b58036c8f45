//! Postgres-backed account store, one JSONB row per (access level, id).

use crate::schema;
use crate::store::{AccountStore, FieldFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the accounts table when it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when the DDL statement fails.
    pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
        let query = "CREATE TABLE IF NOT EXISTS accounts (
            access_level TEXT NOT NULL,
            id UUID NOT NULL,
            document JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (access_level, id)
        )";

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE TABLE",
            db.statement = query
        );

        sqlx::query(query)
            .execute(pool)
            .instrument(span)
            .await
            .context("Failed to create accounts table")?;

        Ok(())
    }
}

/// Fold dotted-path equality filters into one JSONB containment probe.
fn containment_filter(filters: &[FieldFilter]) -> Value {
    let mut probe = Value::Object(Map::new());
    for filter in filters {
        let segments: Vec<&str> = filter.field.split('.').collect();
        schema::set_value(&mut probe, &segments, filter.value.clone());
    }
    probe
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn fetch(&self, level: &str, id: Uuid) -> Result<Option<Value>> {
        let query = "SELECT document FROM accounts WHERE access_level = $1 AND id = $2";

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(level)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Failed to fetch account partition")?;

        Ok(row.map(|row| row.get::<Value, _>("document")))
    }

    async fn put(&self, level: &str, id: Uuid, document: &Value) -> Result<()> {
        let query = "INSERT INTO accounts (access_level, id, document)
            VALUES ($1, $2, $3)
            ON CONFLICT (access_level, id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()";

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        sqlx::query(query)
            .bind(level)
            .bind(id)
            .bind(document)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("Failed to write account partition")?;

        Ok(())
    }

    async fn query_one(
        &self,
        level: &str,
        filters: &[FieldFilter],
    ) -> Result<Option<(Uuid, Value)>> {
        let query = "SELECT id, document FROM accounts
            WHERE access_level = $1 AND document @> $2 LIMIT 1";

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let probe = containment_filter(filters);

        let row = sqlx::query(query)
            .bind(level)
            .bind(&probe)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Failed to query account partition")?;

        Ok(row.map(|row| (row.get::<Uuid, _>("id"), row.get::<Value, _>("document"))))
    }
}
