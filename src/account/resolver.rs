//! Ordered identity resolution over the configured identity keys.

use crate::account::error::AuthError;
use crate::schema::{self, AuthSchema};
use crate::store::{AccountStore, FieldFilter};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Resolve a submitted candidate to a stored account id.
///
/// Identity keys are tried in configured order and the first hit wins, so
/// key order encodes lookup priority. Keys carrying a verify flag only
/// match records where that flag is `true`.
///
/// # Errors
/// Returns [`AuthError::Store`] when the backing store fails.
pub async fn resolve_identity(
    store: &dyn AccountStore,
    schema: &AuthSchema,
    candidate: &Value,
) -> Result<Option<Uuid>, AuthError> {
    for key in schema.identity_keys() {
        // A key absent from the candidate cannot form a query.
        let Some(value) = schema::value_at(candidate, key.path().segments()) else {
            continue;
        };

        let mut filters = vec![FieldFilter::new(key.path().dotted_field(), value.clone())];
        if let Some(verify) = key.verify() {
            filters.push(FieldFilter::new(verify.dotted_field(), Value::Bool(true)));
        }

        let found = store
            .query_one(key.path().level(), &filters)
            .await
            .map_err(AuthError::Store)?;

        if let Some((id, _)) = found {
            debug!(key = %key.path(), "identity key matched");
            return Ok(Some(id));
        }
    }

    Ok(None)
}
