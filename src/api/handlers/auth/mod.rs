//! Auth endpoints: sign-up, sign-in, sign-out, change, forgot, reset,
//! and session introspection. Handlers stay thin; the account engine in
//! [`crate::account`] does the actual work.

pub mod change;
pub mod forgot;
pub mod reset;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use state::{AuthConfig, AuthState};

use crate::account::AuthError;
use crate::api::handlers::auth::session::{establish_session, SessionClaims};
use crate::api::handlers::auth::types::AccountResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::error;

/// Map engine failures onto the HTTP surface. Store and hashing failures
/// log the cause and answer with an opaque message.
fn error_response(err: &AuthError) -> (StatusCode, String) {
    let status = match err {
        AuthError::InputInvalid(_)
        | AuthError::MissingCredentialField
        | AuthError::NotVerified
        | AuthError::TokenInvalid(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredential => StatusCode::UNAUTHORIZED,
        AuthError::AccountNotFound => StatusCode::NOT_FOUND,
        AuthError::AlreadyExists => StatusCode::CONFLICT,
        AuthError::Store(err) => {
            error!("Account store failure: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage failure".to_string(),
            );
        }
        AuthError::Hashing(err) => {
            error!("Credential hashing failure: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Hashing failure".to_string(),
            );
        }
    };
    (status, err.to_string())
}

fn require_object(candidate: &Value) -> Result<(), AuthError> {
    if candidate.is_object() {
        Ok(())
    } else {
        Err(AuthError::InputInvalid("account must be an object"))
    }
}

/// Success body plus the Set-Cookie header establishing `claims`.
fn session_response(status: StatusCode, state: &AuthState, claims: SessionClaims) -> Response {
    (
        status,
        establish_session(state, claims),
        Json(AccountResponse {
            id: claims.id,
            registered: claims.registered,
        }),
    )
        .into_response()
}
