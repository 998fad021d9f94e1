//! Sign-in flow: login, provider callback, logout and the auth-error echo.

use crate::GatewayState;
use crate::api::found;
use crate::error::{AppError, ErrorEnvelope};
use crate::session::{
    self, SessionId, SessionRecord, SessionStore, clear_session_cookie, random_token,
    session_cookie,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::form_urlencoded;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    /// Failure flag set by a callback whose token or profile call failed.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthErrorParams {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// OAuth2 error code for a user who cancelled or refused consent.
pub const ACCESS_DENIED: &str = "access_denied";

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Start the authorization-code flow, unless the browser is already signed in.
#[tracing::instrument(skip_all)]
pub async fn login<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    jar: SignedCookieJar,
    Query(params): Query<LoginParams>,
) -> Result<Response, AppError> {
    tracing::info!("Login route accessed");
    if session::authenticated_user(state.sessions.as_ref(), &jar)
        .await?
        .is_some()
    {
        tracing::info!("User already authenticated, redirecting to dashboard");
        return Ok(found("/dashboard"));
    }

    // Restarting the flow here would bounce straight back to the provider.
    if let Some(code) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %code, "Previous sign-in attempt failed");
        return Ok(found(&format!("/login-page?error={}", encode(&code))));
    }

    let id = match session::session_id(&jar) {
        Some(id) => id,
        None => SessionId::generate()?,
    };
    let csrf_state = random_token()?;
    state
        .sessions
        .save(
            &id,
            SessionRecord::pending(csrf_state.clone(), OffsetDateTime::now_utc()),
        )
        .await?;

    tracing::info!("Initiating OAuth2 authentication");
    let location = state.provider.authorization_url(&csrf_state);
    let jar = jar.add(session_cookie(&id, state.secure_cookies()));
    Ok((jar, found(&location)).into_response())
}

/// Complete a login from the provider's redirect.
///
/// Token or profile failures redirect to `/login` with a failure flag and
/// leave the session store untouched.
#[tracing::instrument(skip_all)]
pub async fn callback<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    jar: SignedCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    if let Some(error) = params.error.as_deref() {
        let err = AppError::from_provider(error, params.error_description.as_deref());
        // A user who cancels or declines consent goes back to the login page.
        if error == ACCESS_DENIED && !matches!(err, AppError::TenantAccessDenied { .. }) {
            tracing::warn!(error = %err, "Sign-in declined at the provider");
            return Ok(found(&format!("/login?error={ACCESS_DENIED}")));
        }
        return Err(err);
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Authentication("Missing authorization code".into()))?;

    let pending_id = session::session_id(&jar)
        .ok_or_else(|| AppError::Authentication("No login in progress for this browser".into()))?;
    let pending = state.sessions.load(&pending_id).await?;
    let returned_state = params.state.unwrap_or_default();
    if !pending.is_some_and(|record| record.accepts_callback_state(&returned_state)) {
        return Err(AppError::Authentication(
            "State does not match a pending login".into(),
        ));
    }

    let user = match state.provider.authenticate(&code).await {
        Ok(user) => user,
        Err(e) if e.is_tenant_rejection() => {
            return Err(AppError::TenantAccessDenied {
                detail: e.to_string(),
            });
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                status = ?e.status(),
                detail = ?e.detail(),
                "Authentication error"
            );
            let flag = e.upstream().failure_code();
            return Ok(found(&format!("/login?error={flag}")));
        }
    };

    // Issue a fresh identifier so the pre-login one cannot be replayed.
    // Pending record goes first so a store fault never leaves an orphaned
    // authenticated record.
    let id = SessionId::generate()?;
    state.sessions.destroy(&pending_id).await?;
    state
        .sessions
        .save(
            &id,
            SessionRecord::authenticated(user, OffsetDateTime::now_utc()),
        )
        .await?;

    let jar = jar.add(session_cookie(&id, state.secure_cookies()));
    Ok((jar, found("/dashboard")).into_response())
}

/// Destroy the current session. Succeeds when there is none.
#[tracing::instrument(skip_all)]
pub async fn logout<S: SessionStore>(
    State(state): State<GatewayState<S>>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if let Some(id) = session::session_id(&jar) {
        let existed = state.sessions.destroy(&id).await?;
        tracing::info!(existed, "Session destroyed");
    }
    Ok((jar.remove(clear_session_cookie()), found("/")).into_response())
}

/// Echo a provider error as a structured 400.
#[tracing::instrument]
pub async fn auth_error(Query(params): Query<AuthErrorParams>) -> impl IntoResponse {
    let error = params
        .error
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());
    let description = params
        .error_description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "No description available".to_string());
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    tracing::warn!(error = %error, description = %description, "Authentication error reported");

    (
        StatusCode::BAD_REQUEST,
        Json(
            ErrorEnvelope::new(error)
                .with_details(description)
                .with_timestamp(timestamp),
        ),
    )
}
