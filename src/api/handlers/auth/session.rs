//! Self-contained signed sessions. No server-side session table: the
//! cookie carries the account id, registration flag, and issue time under
//! an HMAC, and validation is a signature plus window check.

use crate::api::handlers::auth::state::AuthState;
use crate::api::handlers::auth::types::AccountResponse;
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Domain separation for session signatures, distinct from recovery
/// token signatures under the same secret.
const SESSION_CONTEXT: &str = "chiavi.session.v1";

/// What a verified session cookie asserts about the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SessionClaims {
    pub id: Uuid,
    pub registered: bool,
}

fn session_mac(secret: &SecretString, id: Uuid, registered: bool, issued_at: i64) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{SESSION_CONTEXT}:{id}:{registered}:{issued_at}").as_bytes());
    mac
}

fn encode_session_at(state: &AuthState, claims: SessionClaims, issued_at: i64) -> String {
    let signature = session_mac(state.secret(), claims.id, claims.registered, issued_at)
        .finalize()
        .into_bytes();
    format!(
        "{}.{}.{issued_at}.{}",
        claims.id,
        claims.registered,
        Base64UrlUnpadded::encode_string(&signature)
    )
}

fn decode_session_at(state: &AuthState, token: &str, now: i64) -> Option<SessionClaims> {
    let mut parts = token.splitn(4, '.');
    let id = Uuid::parse_str(parts.next()?).ok()?;
    let registered: bool = parts.next()?.parse().ok()?;
    let issued_at: i64 = parts.next()?.parse().ok()?;
    let signature = Base64UrlUnpadded::decode_vec(parts.next()?).ok()?;

    session_mac(state.secret(), id, registered, issued_at)
        .verify_slice(&signature)
        .ok()?;

    let ttl = state.config().session_ttl_seconds();
    if now < issued_at || now >= issued_at + ttl {
        return None;
    }

    Some(SessionClaims { id, registered })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string)
}

/// Pull the session token from the Authorization header or, failing that,
/// the session cookie.
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == cookie_name {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// The caller's session, when the request carries a valid one. Missing,
/// malformed, expired, or forged tokens all read as no session.
pub(super) fn current_session(headers: &HeaderMap, state: &AuthState) -> Option<SessionClaims> {
    let token = extract_session_token(headers, state.config().session_cookie())?;
    decode_session_at(state, &token, Utc::now().timestamp())
}

fn session_cookie(
    state: &AuthState,
    claims: SessionClaims,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let token = encode_session_at(state, claims, Utc::now().timestamp());
    let mut cookie = format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.config().session_cookie(),
        state.config().session_ttl_seconds()
    );
    if state.config().session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the Set-Cookie headers that establish `claims` as the session.
pub(super) fn establish_session(state: &AuthState, claims: SessionClaims) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match session_cookie(state, claims) {
        Ok(cookie) => {
            headers.insert(header::SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
        }
    }
    headers
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Active session", body = AccountResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match current_session(&headers, &auth_state) {
        Some(claims) => (
            StatusCode::OK,
            Json(AccountResponse {
                id: claims.id,
                registered: claims.registered,
            }),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
