//! Stateless recovery tokens: HMAC-SHA256 over the account id and issue
//! time, bounded by a validity window.
//!
//! Nothing is persisted per token, so a token stays valid for its whole
//! window and can be presented more than once. Rotating the secret
//! invalidates everything outstanding.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation for recovery signatures, so they can never double as
/// session signatures.
const RECOVERY_CONTEXT: &str = "chiavi.recovery.v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed recovery token")]
    Malformed,
    #[error("recovery token signature mismatch")]
    Signature,
    #[error("recovery token expired")]
    Expired,
}

/// Issues and validates recovery tokens for one shared secret.
#[derive(Clone)]
pub struct RecoveryTokens {
    secret: SecretString,
    ttl_seconds: i64,
}

impl RecoveryTokens {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token bound to `id`, valid from now for the configured TTL.
    #[must_use]
    pub fn issue(&self, id: Uuid) -> String {
        self.issue_at(id, Utc::now().timestamp())
    }

    /// Validate a token against `id` and the current clock.
    ///
    /// # Errors
    /// - [`TokenError::Malformed`] when the wire shape does not parse.
    /// - [`TokenError::Signature`] when the MAC does not match, including
    ///   tokens issued for a different account id.
    /// - [`TokenError::Expired`] outside the validity window.
    pub fn validate(&self, id: Uuid, token: &str) -> Result<(), TokenError> {
        self.validate_at(id, token, Utc::now().timestamp())
    }

    fn issue_at(&self, id: Uuid, issued_at: i64) -> String {
        let signature = self.mac(id, issued_at).finalize().into_bytes();
        format!(
            "{issued_at}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        )
    }

    fn validate_at(&self, id: Uuid, token: &str, now: i64) -> Result<(), TokenError> {
        let (timestamp, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let issued_at: i64 = timestamp.parse().map_err(|_| TokenError::Malformed)?;
        let signature =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| TokenError::Malformed)?;

        // Signature first: expiry must not leak whether a forgery was
        // otherwise well-timed.
        self.mac(id, issued_at)
            .verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        if now < issued_at || now >= issued_at + self.ttl_seconds {
            return Err(TokenError::Expired);
        }

        Ok(())
    }

    fn mac(&self, id: Uuid, issued_at: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(format!("{RECOVERY_CONTEXT}:{id}:{issued_at}").as_bytes());
        mac
    }
}
