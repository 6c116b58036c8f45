//! Per-partition account synchronization with update-wins deep merge.
//!
//! Partitions are written one at a time without a surrounding transaction,
//! so a crash mid-sync can leave levels briefly inconsistent. Re-running
//! the same sync converges: merging an update into its own result is a
//! no-op.

use crate::account::error::AuthError;
use crate::schema::AuthSchema;
use crate::store::AccountStore;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// Registration marker carried inside every partition document.
pub const REGISTERED_FIELD: &str = "registered";

/// Deep-merge `update` into `existing`. Objects merge key-wise with the
/// update winning on conflict; everything else, arrays and `null`
/// included, replaces wholesale.
pub fn merge_documents(existing: &mut Value, update: &Value) {
    match (existing, update) {
        (Value::Object(existing_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_documents(
                    existing_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
        (existing, update) => *existing = update.clone(),
    }
}

/// What a sync observed about the account's registration state.
#[derive(Clone, Copy, Debug)]
pub struct SyncOutcome {
    pub registered: bool,
}

/// Merge an update, keyed by access level, into every partition of the
/// account and write the results back.
///
/// Levels absent from the update are still rewritten from their stored
/// state, so a fresh account gets a document at every level.
///
/// # Errors
/// Returns [`AuthError::Store`] when a partition read or write fails;
/// partitions already written stay written.
pub async fn sync_account(
    store: &dyn AccountStore,
    schema: &AuthSchema,
    id: Uuid,
    update: &Value,
) -> Result<SyncOutcome, AuthError> {
    let mut registered = false;

    for level in schema.access_levels() {
        let mut document = store
            .fetch(level, id)
            .await
            .map_err(AuthError::Store)?
            .unwrap_or_else(|| Value::Object(Map::new()));

        if let Some(level_update) = update.get(level) {
            merge_documents(&mut document, level_update);
        }

        if let Some(flag) = document.get(REGISTERED_FIELD).and_then(Value::as_bool) {
            registered = flag;
        }

        store
            .put(level, id, &document)
            .await
            .map_err(AuthError::Store)?;
    }

    debug!(account_id = %id, registered, "account synchronized");
    Ok(SyncOutcome { registered })
}

/// Read the registration flag from the first access level's document.
///
/// # Errors
/// Returns [`AuthError::Store`] when the read fails.
pub async fn lookup_registered(
    store: &dyn AccountStore,
    schema: &AuthSchema,
    id: Uuid,
) -> Result<bool, AuthError> {
    let Some(level) = schema.access_levels().first() else {
        return Ok(false);
    };
    let record = store.fetch(level, id).await.map_err(AuthError::Store)?;
    Ok(record
        .as_ref()
        .and_then(|document| document.get(REGISTERED_FIELD))
        .and_then(Value::as_bool)
        .unwrap_or(false))
}
