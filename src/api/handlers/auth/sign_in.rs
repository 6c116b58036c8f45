use crate::account::{lookup_registered, resolve_identity, verify_credentials, AuthError};
use crate::api::handlers::auth::session::SessionClaims;
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::{AccountResponse, SignInRequest};
use crate::api::handlers::auth::{error_response, require_object, session_response};
use crate::store::{AccountStore, SharedStore};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::Value;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AccountResponse),
        (status = 400, description = "Invalid or incomplete payload"),
        (status = 401, description = "Credential mismatch"),
        (status = 404, description = "No account matched the identity fields"),
        (status = 500, description = "Storage failure")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match authenticate(&auth_state, store.as_ref(), &request.account).await {
        Ok(claims) => session_response(StatusCode::OK, &auth_state, claims),
        Err(err) => error_response(&err).into_response(),
    }
}

async fn authenticate(
    state: &AuthState,
    store: &dyn AccountStore,
    candidate: &Value,
) -> Result<SessionClaims, AuthError> {
    require_object(candidate)?;

    let id = resolve_identity(store, state.schema(), candidate)
        .await?
        .ok_or(AuthError::AccountNotFound)?;
    verify_credentials(store, state.schema(), state.hasher(), id, candidate).await?;
    let registered = lookup_registered(store, state.schema(), id).await?;

    Ok(SessionClaims { id, registered })
}
