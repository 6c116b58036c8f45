//! Account storage: one JSON document per (access level, account id).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgAccountStore;

/// Equality filter on a dotted in-document field path.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    #[must_use]
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Partitioned document store backing the account engine.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch one partition document, `None` when the account has no record
    /// at this access level.
    async fn fetch(&self, level: &str, id: Uuid) -> Result<Option<Value>>;

    /// Write one partition document, replacing any previous version.
    async fn put(&self, level: &str, id: Uuid, document: &Value) -> Result<()>;

    /// Find one account whose partition document matches every filter.
    async fn query_one(
        &self,
        level: &str,
        filters: &[FieldFilter],
    ) -> Result<Option<(Uuid, Value)>>;
}

pub type SharedStore = Arc<dyn AccountStore>;
