use crate::account::{resolve_identity, AuthError};
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::ForgotRequest;
use crate::api::handlers::auth::{error_response, require_object};
use crate::schema;
use crate::store::{AccountStore, SharedStore};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/v1/auth/forgot",
    request_body = ForgotRequest,
    responses(
        (status = 204, description = "Recovery token issued and handed to the delivery channel"),
        (status = 400, description = "Invalid payload or unverified recovery method"),
        (status = 404, description = "No account matched the identity fields"),
        (status = 500, description = "Storage or delivery failure")
    ),
    tag = "auth"
)]
pub async fn forgot(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    payload: Option<Json<ForgotRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match request_recovery(&auth_state, store.as_ref(), &request).await {
        Ok((method, id, token)) => match auth_state.sender().deliver(&method, id, &token) {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(err) => {
                error!("Failed to deliver recovery token: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Delivery failure".to_string(),
                )
                    .into_response()
            }
        },
        Err(err) => error_response(&err).into_response(),
    }
}

/// Resolve the account, enforce the method's verify flag, and issue a
/// token. The token never appears in the response body; only the delivery
/// channel sees it.
async fn request_recovery(
    state: &AuthState,
    store: &dyn AccountStore,
    request: &ForgotRequest,
) -> Result<(String, Uuid, String), AuthError> {
    require_object(&request.account)?;

    let method = request.method.trim();
    if method.is_empty() {
        return Err(AuthError::InputInvalid("missing recovery method"));
    }
    let key = state
        .schema()
        .identity_key(method)
        .ok_or(AuthError::InputInvalid("unknown recovery method"))?;

    let id = resolve_identity(store, state.schema(), &request.account)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    // The account may have resolved through another key; the chosen
    // method still has to be verified before it can receive a token.
    if let Some(verify) = key.verify() {
        let record = store
            .fetch(verify.level(), id)
            .await
            .map_err(AuthError::Store)?;
        let verified = record
            .as_ref()
            .and_then(|document| schema::value_at(document, verify.field()))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !verified {
            return Err(AuthError::NotVerified);
        }
    }

    let token = state.recovery().issue(id);
    Ok((method.to_string(), id, token))
}
