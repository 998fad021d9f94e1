//! HTTP surface of the gateway.
//!
//! - `pages` - root redirect, login page, dashboard
//! - `auth` - login, callback, logout, auth-error
//! - `health` - liveness probe (`/healthz`)
//!
//! Every failure leaves through [`AppError`]'s responder, including panics
//! (caught by `CatchPanicLayer`) and unknown routes.

pub mod auth;
pub mod health;
pub mod pages;

use crate::GatewayState;
use crate::error::AppError;
use crate::session::SessionStore;
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Creates the gateway router.
pub fn router<S: SessionStore>(state: GatewayState<S>) -> Router {
    Router::new()
        .route("/", get(pages::root::<S>))
        .route("/login-page", get(pages::login_page::<S>))
        .route("/login", get(auth::login::<S>))
        .route("/auth/callback", get(auth::callback::<S>))
        .route("/dashboard", get(pages::dashboard::<S>))
        .route("/logout", get(auth::logout::<S>))
        .route("/auth-error", get(auth::auth_error))
        .route("/healthz", get(health::health))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    tracing::error!(panic = %detail, "Handler panicked");
    AppError::Internal("Something went wrong".into()).into_response()
}

/// Binds `0.0.0.0:<port>` and serves the gateway until the process exits.
#[tracing::instrument(skip(state))]
pub async fn start_webserver<S: SessionStore>(
    state: GatewayState<S>,
    port: u16,
) -> color_eyre::Result<()> {
    let router = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server is running");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
