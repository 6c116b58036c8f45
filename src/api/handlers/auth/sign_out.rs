use crate::account::{lookup_registered, sync_account, AuthError, REGISTERED_FIELD};
use crate::api::handlers::auth::session::{current_session, SessionClaims};
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::AccountResponse;
use crate::api::handlers::auth::{error_response, session_response};
use crate::schema;
use crate::store::{AccountStore, SharedStore};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-out",
    responses(
        (status = 200, description = "Signed out into a fresh guest session", body = AccountResponse),
        (status = 400, description = "No registered session to sign out of"),
        (status = 500, description = "Storage failure")
    ),
    tag = "auth"
)]
pub async fn sign_out(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
) -> impl IntoResponse {
    match rotate_guest(&auth_state, store.as_ref(), &headers).await {
        Ok(claims) => session_response(StatusCode::OK, &auth_state, claims),
        Err(err) => error_response(&err).into_response(),
    }
}

/// Replace the registered session with a brand-new unregistered guest, so
/// the old account id stops traveling with the browser.
async fn rotate_guest(
    state: &AuthState,
    store: &dyn AccountStore,
    headers: &HeaderMap,
) -> Result<SessionClaims, AuthError> {
    let claims =
        current_session(headers, state).ok_or(AuthError::InputInvalid("not signed in"))?;
    if !lookup_registered(store, state.schema(), claims.id).await? {
        return Err(AuthError::InputInvalid("not signed in"));
    }

    let guest_id = Uuid::new_v4();
    let mut guest = Value::Object(Map::new());
    for level in state.schema().access_levels() {
        schema::set_value(
            &mut guest,
            &[level.as_str(), REGISTERED_FIELD],
            Value::Bool(false),
        );
    }
    let outcome = sync_account(store, state.schema(), guest_id, &guest).await?;

    Ok(SessionClaims {
        id: guest_id,
        registered: outcome.registered,
    })
}
