//! Auth endpoint tests over the in-memory store.

use super::session::SessionClaims;
use super::state::{AuthConfig, AuthState};
use super::types::{ChangeRequest, ForgotRequest, ResetRequest, SignInRequest, SignUpRequest};
use super::{change, forgot, reset, session, sign_in, sign_out, sign_up};
use crate::api::delivery::RecoverySender;
use crate::schema::AuthSchema;
use crate::store::{AccountStore, FieldFilter, MemoryStore, SharedStore};
use anyhow::{anyhow, Context, Result};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SCHEMA_JSON: &str = r#"{
    "access_levels": ["public", "private"],
    "identity_keys": ["private.email", "public.username"],
    "fields": {
        "private.email": {},
        "public.username": {},
        "private.password": { "type": "password", "hash": true }
    },
    "skeleton": { "public": { "roles": [] }, "private": {} }
}"#;

/// Same shape, but recovery through email requires the stored
/// `email_verified` flag. Username stays an unverified lookup key.
const VERIFIED_SCHEMA_JSON: &str = r#"{
    "access_levels": ["public", "private"],
    "identity_keys": ["public.username", "private.email"],
    "fields": {
        "public.username": {},
        "private.email": { "verify": "private.email_verified" },
        "private.password": { "type": "password", "hash": true }
    }
}"#;

#[derive(Clone, Default)]
struct CapturingSender {
    deliveries: Arc<Mutex<Vec<(String, Uuid, String)>>>,
}

impl CapturingSender {
    fn deliveries(&self) -> Vec<(String, Uuid, String)> {
        self.deliveries.lock().expect("sender lock").clone()
    }
}

impl RecoverySender for CapturingSender {
    fn deliver(&self, method: &str, id: Uuid, token: &str) -> Result<()> {
        self.deliveries
            .lock()
            .map_err(|_| anyhow!("sender lock poisoned"))?
            .push((method.to_string(), id, token.to_string()));
        Ok(())
    }
}

struct FailingSender;

impl RecoverySender for FailingSender {
    fn deliver(&self, _method: &str, _id: Uuid, _token: &str) -> Result<()> {
        Err(anyhow!("delivery channel down"))
    }
}

fn auth_state(schema_json: &str) -> Arc<AuthState> {
    let schema = AuthSchema::from_json(schema_json).expect("test schema parses");
    Arc::new(AuthState::new(
        AuthConfig::new("http://localhost:3000"),
        Arc::new(schema),
        SecretString::from("0123456789abcdef0123456789abcdef"),
    ))
}

fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

async fn body_json(response: Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("read response body")?;
    serde_json::from_slice(&bytes).context("response body is JSON")
}

fn account_id(body: &Value) -> Result<Uuid> {
    let id = body["id"].as_str().context("id is a string")?;
    Uuid::parse_str(id).context("id is a uuid")
}

/// Turn the Set-Cookie of a successful auth response into a request
/// Cookie header, the way a browser would.
fn cookie_headers(response: &Response) -> HeaderMap {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(ToString::to_string)
        .expect("response sets a session cookie");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&cookie).expect("cookie is ascii"),
    );
    headers
}

fn headers_with_session(state: &AuthState, claims: SessionClaims) -> HeaderMap {
    let set_cookie = session::establish_session(state, claims);
    let cookie = set_cookie
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(ToString::to_string)
        .expect("session cookie builds");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&cookie).expect("cookie is ascii"),
    );
    headers
}

/// Register an account and hand back its id plus request headers carrying
/// the session cookie the sign-up established.
async fn sign_up_account(
    state: &Arc<AuthState>,
    store: &SharedStore,
    account: Value,
) -> Result<(Uuid, HeaderMap)> {
    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(SignUpRequest { account })),
    )
    .await
    .into_response();

    if response.status() != StatusCode::CREATED {
        return Err(anyhow!("sign-up failed: {}", response.status()));
    }
    let headers = cookie_headers(&response);
    let body = body_json(response).await?;

    Ok((account_id(&body)?, headers))
}

#[tokio::test]
async fn sign_up_missing_payload_is_rejected() {
    let state = auth_state(SCHEMA_JSON);
    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state),
        Extension(memory_store()),
        None,
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_up_rejects_non_object_account() {
    let state = auth_state(SCHEMA_JSON);
    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state),
        Extension(memory_store()),
        Some(Json(SignUpRequest {
            account: json!("not an object"),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_up_without_password_is_rejected() {
    let state = auth_state(SCHEMA_JSON);
    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state),
        Extension(memory_store()),
        Some(Json(SignUpRequest {
            account: json!({"private": {"email": "a@x.com"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_up_writes_every_partition() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();

    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(SignUpRequest {
            account: json!({
                "private": {"email": "a@x.com", "password": "secret"},
                "public": {"username": "alice"}
            }),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let body = body_json(response).await?;
    assert_eq!(body["registered"], json!(true));
    let id = account_id(&body)?;

    let private = store
        .fetch("private", id)
        .await?
        .context("private partition written")?;
    assert_eq!(private["email"], json!("a@x.com"));
    assert_eq!(private["registered"], json!(true));
    let stored_password = private["password"]
        .as_str()
        .context("password stays a string")?;
    assert!(stored_password.starts_with("$argon2"));

    let public = store
        .fetch("public", id)
        .await?
        .context("public partition written")?;
    assert_eq!(public["username"], json!("alice"));
    assert_eq!(public["registered"], json!(true));
    // Skeleton defaults survive underneath the candidate.
    assert_eq!(public["roles"], json!([]));
    Ok(())
}

#[tokio::test]
async fn sign_up_conflict_writes_nothing() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "dup@x.com", "password": "secret"}}),
    )
    .await?;

    let response = sign_up::sign_up(
        HeaderMap::new(),
        Extension(state),
        Extension(store.clone()),
        Some(Json(SignUpRequest {
            account: json!({
                "private": {"email": "dup@x.com", "password": "other"},
                "public": {"username": "copycat"}
            }),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let copycat = store
        .query_one(
            "public",
            &[FieldFilter::new("username", json!("copycat"))],
        )
        .await?;
    assert!(copycat.is_none());
    Ok(())
}

#[tokio::test]
async fn sign_up_keeps_the_guest_session_id() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let guest_id = Uuid::new_v4();
    let headers = headers_with_session(
        &state,
        SessionClaims {
            id: guest_id,
            registered: false,
        },
    );

    let response = sign_up::sign_up(
        headers,
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(SignUpRequest {
            account: json!({"private": {"email": "guest@x.com", "password": "secret"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, guest_id);
    Ok(())
}

#[tokio::test]
async fn sign_up_ignores_a_registered_session_id() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (existing_id, _) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "first@x.com", "password": "secret"}}),
    )
    .await?;

    let headers = headers_with_session(
        &state,
        SessionClaims {
            id: existing_id,
            registered: true,
        },
    );
    let response = sign_up::sign_up(
        headers,
        Extension(state),
        Extension(store),
        Some(Json(SignUpRequest {
            account: json!({"private": {"email": "second@x.com", "password": "secret"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await?;
    assert_ne!(account_id(&body)?, existing_id);
    Ok(())
}

#[tokio::test]
async fn sign_in_round_trip() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (id, _) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "secret"}}),
    )
    .await?;

    let response = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "secret"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, id);
    assert_eq!(body["registered"], json!(true));
    Ok(())
}

#[tokio::test]
async fn sign_in_unknown_identity_is_not_found() {
    let state = auth_state(SCHEMA_JSON);
    let response = sign_in::sign_in(
        Extension(state),
        Extension(memory_store()),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "ghost@x.com", "password": "secret"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sign_in_wrong_password_is_unauthorized() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "secret"}}),
    )
    .await?;

    let response = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "wrong"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn sign_in_without_password_field_is_rejected() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "secret"}}),
    )
    .await?;

    let response = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn sign_in_resolves_through_the_first_matching_key() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (by_email, _) = sign_up_account(
        &state,
        &store,
        json!({
            "private": {"email": "a@x.com", "password": "shared"},
            "public": {"username": "alpha"}
        }),
    )
    .await?;
    let (by_username, _) = sign_up_account(
        &state,
        &store,
        json!({
            "private": {"email": "b@x.com", "password": "shared"},
            "public": {"username": "bravo"}
        }),
    )
    .await?;

    // Email is the first configured key, so it decides which account the
    // caller signs into even though the username points elsewhere.
    let response = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({
                "private": {"email": "a@x.com", "password": "shared"},
                "public": {"username": "bravo"}
            }),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, by_email);
    assert_ne!(account_id(&body)?, by_username);
    Ok(())
}

#[tokio::test]
async fn session_endpoint_reports_claims_or_nothing() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let claims = SessionClaims {
        id: Uuid::new_v4(),
        registered: true,
    };
    let headers = headers_with_session(&state, claims);

    let response = session::session(headers, Extension(state.clone()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, claims.id);
    assert_eq!(body["registered"], json!(true));

    let response = session::session(HeaderMap::new(), Extension(state))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn sign_out_requires_a_registered_session() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();

    let response = sign_out::sign_out(
        HeaderMap::new(),
        Extension(state.clone()),
        Extension(store.clone()),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A guest session is not signed in either.
    let guest = headers_with_session(
        &state,
        SessionClaims {
            id: Uuid::new_v4(),
            registered: false,
        },
    );
    let response = sign_out::sign_out(guest, Extension(state), Extension(store))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn sign_out_rotates_to_a_fresh_guest() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (id, headers) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "secret"}}),
    )
    .await?;

    let response = sign_out::sign_out(headers, Extension(state), Extension(store.clone()))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = body_json(response).await?;
    let guest_id = account_id(&body)?;
    assert_ne!(guest_id, id);
    assert_eq!(body["registered"], json!(false));

    let public = store
        .fetch("public", guest_id)
        .await?
        .context("guest public partition written")?;
    assert_eq!(public["registered"], json!(false));
    Ok(())
}

#[tokio::test]
async fn change_requires_a_session() {
    let state = auth_state(SCHEMA_JSON);
    let response = change::change(
        HeaderMap::new(),
        Extension(state),
        Extension(memory_store()),
        Some(Json(ChangeRequest {
            account: json!({"public": {"display_name": "Neo"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_merges_into_existing_partitions() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (id, headers) = sign_up_account(
        &state,
        &store,
        json!({
            "private": {"email": "a@x.com", "password": "secret"},
            "public": {"username": "alice"}
        }),
    )
    .await?;

    let response = change::change(
        headers,
        Extension(state),
        Extension(store.clone()),
        Some(Json(ChangeRequest {
            account: json!({"public": {"display_name": "Neo"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, id);
    assert_eq!(body["registered"], json!(true));

    let public = store.fetch("public", id).await?.context("public exists")?;
    assert_eq!(public["display_name"], json!("Neo"));
    // Untouched fields stay.
    assert_eq!(public["username"], json!("alice"));
    assert_eq!(public["roles"], json!([]));
    Ok(())
}

#[tokio::test]
async fn change_hashes_a_replacement_password() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (_, headers) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "old-secret"}}),
    )
    .await?;

    let response = change::change(
        headers,
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(ChangeRequest {
            account: json!({"private": {"password": "new-secret"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let old = sign_in::sign_in(
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "old-secret"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "new-secret"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(new.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forgot_rejects_unknown_methods() {
    let state = auth_state(SCHEMA_JSON);

    // Empty, unconfigured, and non-identity fields all fail before any
    // account lookup happens.
    for method in ["", "  ", "nope.nope", "private.password"] {
        let response = forgot::forgot(
            Extension(state.clone()),
            Extension(memory_store()),
            Some(Json(ForgotRequest {
                account: json!({"private": {"email": "a@x.com"}}),
                method: method.to_string(),
            })),
        )
        .await
        .into_response();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "method {method:?}"
        );
    }
}

#[tokio::test]
async fn forgot_unknown_account_is_not_found() {
    let sender = CapturingSender::default();
    let state = {
        let schema = AuthSchema::from_json(SCHEMA_JSON).expect("test schema parses");
        Arc::new(
            AuthState::new(
                AuthConfig::new("http://localhost:3000"),
                Arc::new(schema),
                SecretString::from("0123456789abcdef0123456789abcdef"),
            )
            .with_sender(Arc::new(sender.clone())),
        )
    };

    let response = forgot::forgot(
        Extension(state),
        Extension(memory_store()),
        Some(Json(ForgotRequest {
            account: json!({"private": {"email": "ghost@x.com"}}),
            method: "private.email".to_string(),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(sender.deliveries().is_empty());
}

#[tokio::test]
async fn forgot_refuses_an_unverified_method() -> Result<()> {
    let sender = CapturingSender::default();
    let schema = AuthSchema::from_json(VERIFIED_SCHEMA_JSON).expect("test schema parses");
    let state = Arc::new(
        AuthState::new(
            AuthConfig::new("http://localhost:3000"),
            Arc::new(schema),
            SecretString::from("0123456789abcdef0123456789abcdef"),
        )
        .with_sender(Arc::new(sender.clone())),
    );
    let store = memory_store();
    let id = Uuid::new_v4();
    store
        .put("public", id, &json!({"username": "neo", "registered": true}))
        .await?;
    store
        .put(
            "private",
            id,
            &json!({"email": "neo@x.com", "email_verified": false, "registered": true}),
        )
        .await?;

    // Resolves through the username key, but the chosen recovery method
    // is the unverified email.
    let request = ForgotRequest {
        account: json!({"public": {"username": "neo"}}),
        method: "private.email".to_string(),
    };
    let response = forgot::forgot(
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(request)),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(sender.deliveries().is_empty());

    store
        .put(
            "private",
            id,
            &json!({"email": "neo@x.com", "email_verified": true, "registered": true}),
        )
        .await?;
    let response = forgot::forgot(
        Extension(state.clone()),
        Extension(store),
        Some(Json(ForgotRequest {
            account: json!({"public": {"username": "neo"}}),
            method: "private.email".to_string(),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let deliveries = sender.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, "private.email");
    assert_eq!(deliveries[0].1, id);
    assert!(state.recovery().validate(id, &deliveries[0].2).is_ok());
    Ok(())
}

#[tokio::test]
async fn forgot_delivery_failure_is_an_internal_error() -> Result<()> {
    let schema = AuthSchema::from_json(SCHEMA_JSON).expect("test schema parses");
    let state = Arc::new(
        AuthState::new(
            AuthConfig::new("http://localhost:3000"),
            Arc::new(schema),
            SecretString::from("0123456789abcdef0123456789abcdef"),
        )
        .with_sender(Arc::new(FailingSender)),
    );
    let store = memory_store();
    let id = Uuid::new_v4();
    store
        .put("private", id, &json!({"email": "a@x.com", "registered": true}))
        .await?;

    let response = forgot::forgot(
        Extension(state),
        Extension(store),
        Some(Json(ForgotRequest {
            account: json!({"private": {"email": "a@x.com"}}),
            method: "private.email".to_string(),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn reset_requires_token_and_object() {
    let state = auth_state(SCHEMA_JSON);

    let response = reset::reset(
        Extension(state.clone()),
        Extension(memory_store()),
        Some(Json(ResetRequest {
            id: Uuid::new_v4(),
            token: "   ".to_string(),
            account: json!({"private": {"password": "fresh"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Even with a token that would verify, the update has to be an object.
    let id = Uuid::new_v4();
    let token = state.recovery().issue(id);
    let response = reset::reset(
        Extension(state),
        Extension(memory_store()),
        Some(Json(ResetRequest {
            id,
            token,
            account: json!(42),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_replaces_the_password() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (id, _) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "forgotten"}}),
    )
    .await?;

    let token = state.recovery().issue(id);
    let response = reset::reset(
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(ResetRequest {
            id,
            token,
            account: json!({"private": {"password": "fresh"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = body_json(response).await?;
    assert_eq!(account_id(&body)?, id);
    assert_eq!(body["registered"], json!(true));

    let fresh = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "fresh"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(fresh.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn reset_rejects_a_foreign_token() -> Result<()> {
    let state = auth_state(SCHEMA_JSON);
    let store = memory_store();
    let (id, _) = sign_up_account(
        &state,
        &store,
        json!({"private": {"email": "a@x.com", "password": "forgotten"}}),
    )
    .await?;

    let token = state.recovery().issue(Uuid::new_v4());
    let response = reset::reset(
        Extension(state.clone()),
        Extension(store.clone()),
        Some(Json(ResetRequest {
            id,
            token,
            account: json!({"private": {"password": "hijacked"}}),
        })),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The stored credential is untouched.
    let original = sign_in::sign_in(
        Extension(state),
        Extension(store),
        Some(Json(SignInRequest {
            account: json!({"private": {"email": "a@x.com", "password": "forgotten"}}),
        })),
    )
    .await
    .into_response();
    assert_eq!(original.status(), StatusCode::OK);
    Ok(())
}
