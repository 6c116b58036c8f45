//! Credential verification and hashing against the schema's password fields.

use crate::account::error::AuthError;
use crate::schema::{self, AuthSchema};
use crate::store::AccountStore;
use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde_json::Value;
use uuid::Uuid;

/// Hashing strategy for password-typed fields flagged `hash` in the schema.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext credential for storage.
    ///
    /// # Errors
    /// Returns an error when the underlying hash computation fails.
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Check a plaintext credential against a stored hash.
    fn verify(&self, plaintext: &str, stored: &str) -> bool;
}

/// Argon2id with the crate defaults and a random per-credential salt.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash credential: {err}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        PasswordHash::new(stored).map_or(false, |parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Whether the candidate carries at least one password-typed field.
/// Explicit `null` reads as absent.
#[must_use]
pub fn contains_password_field(schema: &AuthSchema, candidate: &Value) -> bool {
    schema.password_fields().any(|rule| {
        schema::value_at(candidate, rule.path().segments()).is_some_and(|value| !value.is_null())
    })
}

/// Verify every password-typed field present in the submitted candidate
/// against the stored account.
///
/// # Errors
/// - [`AuthError::MissingCredentialField`] when no password field was
///   submitted.
/// - [`AuthError::InputInvalid`] when a submitted password is not a string.
/// - [`AuthError::InvalidCredential`] on the first comparison failure,
///   including a missing stored record or stored field.
/// - [`AuthError::Store`] when the backing store fails.
pub async fn verify_credentials(
    store: &dyn AccountStore,
    schema: &AuthSchema,
    hasher: &dyn CredentialHasher,
    id: Uuid,
    submitted: &Value,
) -> Result<(), AuthError> {
    // Rejected before touching the store so a credential-less probe never
    // costs a fetch.
    if !contains_password_field(schema, submitted) {
        return Err(AuthError::MissingCredentialField);
    }

    for rule in schema.password_fields() {
        let value = match schema::value_at(submitted, rule.path().segments()) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        let Some(plaintext) = value.as_str() else {
            return Err(AuthError::InputInvalid("password fields must be strings"));
        };

        let record = store
            .fetch(rule.path().level(), id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidCredential)?;
        let stored = schema::value_at(&record, rule.path().field())
            .and_then(Value::as_str)
            .ok_or(AuthError::InvalidCredential)?;

        let matched = if rule.hash() {
            hasher.verify(plaintext, stored)
        } else {
            plaintext == stored
        };
        if !matched {
            return Err(AuthError::InvalidCredential);
        }
    }

    Ok(())
}

/// Replace hash-flagged password fields in the candidate with their stored
/// form. Fields without the `hash` flag pass through untouched.
///
/// # Errors
/// - [`AuthError::InputInvalid`] when a present password is not a string.
/// - [`AuthError::Hashing`] when hashing fails.
pub fn hash_credentials(
    schema: &AuthSchema,
    hasher: &dyn CredentialHasher,
    candidate: &mut Value,
) -> Result<(), AuthError> {
    for rule in schema.password_fields() {
        if !rule.hash() {
            continue;
        }
        let plaintext = match schema::value_at(candidate, rule.path().segments()) {
            Some(Value::String(plaintext)) => plaintext.clone(),
            Some(Value::Null) | None => continue,
            Some(_) => return Err(AuthError::InputInvalid("password fields must be strings")),
        };
        let digest = hasher.hash(&plaintext).map_err(AuthError::Hashing)?;
        schema::set_value(candidate, rule.path().segments(), Value::String(digest));
    }
    Ok(())
}
