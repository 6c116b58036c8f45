//! Account engine: identity resolution, credential checks, partition sync,
//! and recovery tokens. Transport-agnostic; the HTTP layer sits on top.

pub mod credentials;
pub mod error;
pub mod recovery;
pub mod resolver;
pub mod sync;

pub use credentials::{
    contains_password_field, hash_credentials, verify_credentials, Argon2Hasher, CredentialHasher,
};
pub use error::AuthError;
pub use recovery::{RecoveryTokens, TokenError};
pub use resolver::resolve_identity;
pub use sync::{lookup_registered, merge_documents, sync_account, SyncOutcome, REGISTERED_FIELD};
