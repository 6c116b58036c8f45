use crate::account::{hash_credentials, sync_account, AuthError};
use crate::api::handlers::auth::session::{current_session, SessionClaims};
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::{AccountResponse, ChangeRequest};
use crate::api::handlers::auth::{error_response, require_object, session_response};
use crate::store::{AccountStore, SharedStore};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/v1/auth/change",
    request_body = ChangeRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Storage failure")
    ),
    tag = "auth"
)]
pub async fn change(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    payload: Option<Json<ChangeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let Some(claims) = current_session(&headers, &auth_state) else {
        return (StatusCode::UNAUTHORIZED, "Not signed in".to_string()).into_response();
    };

    match update_account(&auth_state, store.as_ref(), claims, request.account).await {
        Ok(claims) => session_response(StatusCode::OK, &auth_state, claims),
        Err(err) => error_response(&err).into_response(),
    }
}

async fn update_account(
    state: &AuthState,
    store: &dyn AccountStore,
    claims: SessionClaims,
    mut candidate: Value,
) -> Result<SessionClaims, AuthError> {
    require_object(&candidate)?;
    hash_credentials(state.schema(), state.hasher(), &mut candidate)?;
    let outcome = sync_account(store, state.schema(), claims.id, &candidate).await?;

    Ok(SessionClaims {
        id: claims.id,
        registered: outcome.registered,
    })
}
