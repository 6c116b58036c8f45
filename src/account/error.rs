use crate::account::recovery::TokenError;
use thiserror::Error;

/// Failures surfaced by the account engine. HTTP handlers map these onto
/// status codes; the engine itself stays transport-agnostic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The submitted payload is structurally unusable.
    #[error("invalid input: {0}")]
    InputInvalid(&'static str),

    /// No stored account matched the submitted identity fields.
    #[error("account not found")]
    AccountNotFound,

    /// An account matched but a credential comparison failed.
    #[error("invalid credential")]
    InvalidCredential,

    /// The operation needs at least one password-typed field and none was
    /// submitted.
    #[error("missing credential field")]
    MissingCredentialField,

    /// Sign-up identity fields already belong to a stored account.
    #[error("account already exists")]
    AlreadyExists,

    /// The recovery method's verify flag is not set on the stored account.
    #[error("account not verified")]
    NotVerified,

    /// The recovery token failed validation.
    #[error(transparent)]
    TokenInvalid(#[from] TokenError),

    /// The backing store failed.
    #[error("account store failure: {0}")]
    Store(anyhow::Error),

    /// Credential hashing failed.
    #[error("credential hashing failed: {0}")]
    Hashing(anyhow::Error),
}
