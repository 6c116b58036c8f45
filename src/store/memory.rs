//! In-memory store for tests and single-process setups.

use crate::schema;
use crate::store::{AccountStore, FieldFilter};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Keeps every partition document in a single ordered map, so queries scan
/// in a stable order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<(String, Uuid), Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.partitions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.partitions.read().await.is_empty()
    }
}

fn matches(document: &Value, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|filter| {
        let segments: Vec<&str> = filter.field.split('.').collect();
        schema::value_at(document, &segments) == Some(&filter.value)
    })
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn fetch(&self, level: &str, id: Uuid) -> Result<Option<Value>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(&(level.to_string(), id)).cloned())
    }

    async fn put(&self, level: &str, id: Uuid, document: &Value) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions.insert((level.to_string(), id), document.clone());
        Ok(())
    }

    async fn query_one(
        &self,
        level: &str,
        filters: &[FieldFilter],
    ) -> Result<Option<(Uuid, Value)>> {
        let partitions = self.partitions.read().await;
        let found = partitions
            .iter()
            .filter(|((stored_level, _), _)| stored_level == level)
            .find(|(_, document)| matches(document, filters))
            .map(|((_, id), document)| (*id, document.clone()));
        Ok(found)
    }
}
