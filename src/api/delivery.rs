//! Recovery token delivery seam.

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

/// Hands an issued recovery token to an out-of-band channel keyed by the
/// recovery method (an identity key such as `private.email`).
pub trait RecoverySender: Send + Sync {
    /// Deliver `token` for `id` over the channel behind `method`.
    ///
    /// # Errors
    /// Returns an error when the delivery channel fails.
    fn deliver(&self, method: &str, id: Uuid, token: &str) -> Result<()>;
}

/// Logs tokens instead of delivering them. Default until a real channel is
/// wired in; useful in development and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogRecoverySender;

impl RecoverySender for LogRecoverySender {
    fn deliver(&self, method: &str, id: Uuid, token: &str) -> Result<()> {
        info!(method, account_id = %id, token, "recovery delivery stub");
        Ok(())
    }
}
