use crate::account::{hash_credentials, sync_account, AuthError};
use crate::api::handlers::auth::session::SessionClaims;
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::{AccountResponse, ResetRequest};
use crate::api::handlers::auth::{error_response, require_object, session_response};
use crate::store::{AccountStore, SharedStore};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/v1/auth/reset",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Credentials replaced and session established", body = AccountResponse),
        (status = 400, description = "Invalid payload or recovery token"),
        (status = 500, description = "Storage failure")
    ),
    tag = "auth"
)]
pub async fn reset(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    payload: Option<Json<ResetRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match reset_account(&auth_state, store.as_ref(), request).await {
        Ok(claims) => session_response(StatusCode::OK, &auth_state, claims),
        Err(err) => error_response(&err).into_response(),
    }
}

async fn reset_account(
    state: &AuthState,
    store: &dyn AccountStore,
    request: ResetRequest,
) -> Result<SessionClaims, AuthError> {
    if request.token.trim().is_empty() {
        return Err(AuthError::InputInvalid("missing recovery token"));
    }
    require_object(&request.account)?;

    state.recovery().validate(request.id, &request.token)?;

    let mut account = request.account;
    hash_credentials(state.schema(), state.hasher(), &mut account)?;
    let outcome = sync_account(store, state.schema(), request.id, &account).await?;

    Ok(SessionClaims {
        id: request.id,
        registered: outcome.registered,
    })
}
