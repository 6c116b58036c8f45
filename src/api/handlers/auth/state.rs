use crate::account::{Argon2Hasher, CredentialHasher, RecoveryTokens};
use crate::api::delivery::{LogRecoverySender, RecoverySender};
use crate::schema::AuthSchema;
use secrecy::SecretString;
use std::sync::Arc;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_RECOVERY_TTL_SECONDS: i64 = 15 * 60;
pub const DEFAULT_SESSION_COOKIE: &str = "chiavi_session";

/// Tunables for the auth endpoints.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    recovery_ttl_seconds: i64,
    session_cookie: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: impl Into<String>) -> Self {
        Self {
            frontend_base_url: frontend_base_url.into(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            recovery_ttl_seconds: DEFAULT_RECOVERY_TTL_SECONDS,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_recovery_ttl_seconds(mut self, seconds: i64) -> Self {
        self.recovery_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn recovery_ttl_seconds(&self) -> i64 {
        self.recovery_ttl_seconds
    }

    pub(super) fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Shared state behind every auth endpoint: config, schema, token signer,
/// credential hasher, and the recovery delivery channel.
pub struct AuthState {
    config: AuthConfig,
    schema: Arc<AuthSchema>,
    secret: SecretString,
    recovery: RecoveryTokens,
    hasher: Arc<dyn CredentialHasher>,
    sender: Arc<dyn RecoverySender>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, schema: Arc<AuthSchema>, secret: SecretString) -> Self {
        let recovery = RecoveryTokens::new(secret.clone(), config.recovery_ttl_seconds());
        Self {
            config,
            schema,
            secret,
            recovery,
            hasher: Arc::new(Argon2Hasher),
            sender: Arc::new(LogRecoverySender),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender: Arc<dyn RecoverySender>) -> Self {
        self.sender = sender;
        self
    }

    pub(crate) fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn schema(&self) -> &AuthSchema {
        &self.schema
    }

    pub(crate) fn recovery(&self) -> &RecoveryTokens {
        &self.recovery
    }

    pub(super) fn hasher(&self) -> &dyn CredentialHasher {
        self.hasher.as_ref()
    }

    pub(super) fn sender(&self) -> &dyn RecoverySender {
        self.sender.as_ref()
    }

    pub(super) fn secret(&self) -> &SecretString {
        &self.secret
    }
}
