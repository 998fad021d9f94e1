//! Root redirect, login page and the protected dashboard.

use crate::GatewayState;
use crate::api::found;
use crate::error::AppError;
use crate::session::{self, SessionStore};
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

#[derive(Template)]
#[template(path = "login-page.html")]
struct LoginPageTemplate<'a> {
    app_name: &'a str,
    notice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageParams {
    #[serde(default)]
    pub error: Option<String>,
}

/// Human-readable text for a login failure flag.
fn failure_notice(code: &str) -> &'static str {
    match code {
        "token_exchange_failed" => "Sign-in could not be completed with the identity provider.",
        "profile_fetch_failed" => "Your profile could not be retrieved after sign-in.",
        "access_denied" => "Sign-in was cancelled at the identity provider.",
        _ => "Sign-in failed. Please try again.",
    }
}

#[tracing::instrument(skip_all)]
pub async fn root<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if session::authenticated_user(state.sessions.as_ref(), &jar)
        .await?
        .is_some()
    {
        tracing::info!("User authenticated, redirecting to dashboard");
        Ok(found("/dashboard"))
    } else {
        tracing::info!("User not authenticated, redirecting to login page");
        Ok(found("/login-page"))
    }
}

#[tracing::instrument(skip_all)]
pub async fn login_page<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    Query(params): Query<LoginPageParams>,
) -> Result<Response, AppError> {
    let template = LoginPageTemplate {
        app_name: &state.config.app_name,
        notice: params.error.as_deref().map(failure_notice),
    };
    let html = template.render().map_err(|e| {
        AppError::Internal(format!("Failed to render login page: {e}"))
    })?;
    Ok(Html(html).into_response())
}

/// Greets the signed-in user; anyone else is sent to `/login`.
#[tracing::instrument(skip_all)]
pub async fn dashboard<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    match session::authenticated_user(state.sessions.as_ref(), &jar).await? {
        Some(user) => Ok(format!("Welcome {}!", user.display_name).into_response()),
        None => {
            tracing::info!("Authentication required - redirecting to login");
            Ok(found("/login"))
        }
    }
}
