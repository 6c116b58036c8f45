use crate::account::{
    contains_password_field, hash_credentials, merge_documents, resolve_identity, sync_account,
    AuthError, REGISTERED_FIELD,
};
use crate::api::handlers::auth::session::{current_session, SessionClaims};
use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::{AccountResponse, SignUpRequest};
use crate::api::handlers::auth::{error_response, require_object, session_response};
use crate::schema;
use crate::store::{AccountStore, SharedStore};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid or incomplete payload"),
        (status = 409, description = "Identity fields already claimed"),
        (status = 500, description = "Storage failure")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(store): Extension<SharedStore>,
    payload: Option<Json<SignUpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match create_account(&auth_state, store.as_ref(), &headers, request.account).await {
        Ok(claims) => session_response(StatusCode::CREATED, &auth_state, claims),
        Err(err) => error_response(&err).into_response(),
    }
}

async fn create_account(
    state: &AuthState,
    store: &dyn AccountStore,
    headers: &HeaderMap,
    candidate: Value,
) -> Result<SessionClaims, AuthError> {
    require_object(&candidate)?;

    let mut account = state.schema().skeleton().clone();
    merge_documents(&mut account, &candidate);

    if !contains_password_field(state.schema(), &account) {
        return Err(AuthError::MissingCredentialField);
    }

    // Nothing is written until the identity fields are known to be free.
    if resolve_identity(store, state.schema(), &account)
        .await?
        .is_some()
    {
        return Err(AuthError::AlreadyExists);
    }

    // A guest session keeps its id across registration.
    let id = current_session(headers, state)
        .filter(|session| !session.registered)
        .map_or_else(Uuid::new_v4, |session| session.id);

    hash_credentials(state.schema(), state.hasher(), &mut account)?;
    for level in state.schema().access_levels() {
        schema::set_value(
            &mut account,
            &[level.as_str(), REGISTERED_FIELD],
            Value::Bool(true),
        );
    }

    let outcome = sync_account(store, state.schema(), id, &account).await?;
    Ok(SessionClaims {
        id,
        registered: outcome.registered,
    })
}
