//! HTTP surface: the `/v1/auth` endpoints plus health, behind the shared
//! middleware stack (request ids, trace spans, CORS pinned to the frontend
//! origin).

use crate::store::{PgAccountStore, SharedStore};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, sync::mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

pub mod delivery;
pub(crate) mod handlers;
mod openapi;

pub use handlers::auth::{AuthConfig, AuthState};
pub use openapi::openapi;

/// Connect to the database, bootstrap the accounts table, and serve until
/// a shutdown signal arrives.
///
/// # Errors
/// Returns an error if the pool cannot connect, the table bootstrap fails,
/// or the server fails to start.
pub async fn new(port: u16, dsn: String, auth_state: AuthState) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    PgAccountStore::ensure_schema(&pool).await?;

    let store: SharedStore = Arc::new(PgAccountStore::new(pool.clone()));

    serve(port, pool, store, auth_state).await
}

/// Serve the router over an already-connected pool and store. Split from
/// [`new`] so alternative stores can be wired in.
///
/// # Errors
/// Returns an error if the frontend origin is invalid or the listener
/// fails to bind.
pub async fn serve(
    port: u16,
    pool: PgPool,
    store: SharedStore,
    auth_state: AuthState,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(());
    });

    let auth_state = Arc::new(auth_state);

    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = router()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(store)),
        )
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            rx.recv().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Auth routes without middleware; layered in [`serve`].
fn router() -> Router {
    Router::new()
        .route("/v1/auth/sign-up", post(handlers::auth::sign_up::sign_up))
        .route("/v1/auth/sign-in", post(handlers::auth::sign_in::sign_in))
        .route(
            "/v1/auth/sign-out",
            post(handlers::auth::sign_out::sign_out),
        )
        .route("/v1/auth/change", post(handlers::auth::change::change))
        .route("/v1/auth/forgot", post(handlers::auth::forgot::forgot))
        .route("/v1/auth/reset", post(handlers::auth::reset::reset))
        .route("/v1/auth/session", get(handlers::auth::session::session))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
