use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Substring the identity provider uses when a principal is not provisioned
/// in the tenant (AADSTS50020 and friends).
pub const TENANT_NOT_PROVISIONED: &str = "does not exist in tenant";

pub const TENANT_ACCESS_DENIED_MESSAGE: &str = "Access Denied: Your account is not registered in this organization. Please contact your administrator for access.";
pub const TENANT_ACCESS_DENIED_DETAILS: &str =
    "You need to be added as an external user in the tenant first.";

/// The outbound collaborator a call was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Token,
    Profile,
}

impl Upstream {
    /// Flag appended to the login redirect when a call to this upstream fails.
    pub fn failure_code(self) -> &'static str {
        match self {
            Upstream::Token => "token_exchange_failed",
            Upstream::Profile => "profile_fetch_failed",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Token => f.write_str("token endpoint"),
            Upstream::Profile => f.write_str("profile API"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Request to {upstream} failed: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },
    #[error("{upstream} returned HTTP {status}: {detail}")]
    Http {
        upstream: Upstream,
        status: StatusCode,
        detail: String,
    },
    #[error("Invalid JSON from {upstream}: {detail}")]
    InvalidJson { upstream: Upstream, detail: String },
    #[error("Profile is missing required field `{0}`")]
    IncompleteProfile(&'static str),
}

impl ExchangeError {
    pub fn upstream(&self) -> Upstream {
        match self {
            ExchangeError::Transport { upstream, .. }
            | ExchangeError::Http { upstream, .. }
            | ExchangeError::InvalidJson { upstream, .. } => *upstream,
            ExchangeError::IncompleteProfile(_) => Upstream::Profile,
        }
    }

    /// HTTP status carried by the upstream response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ExchangeError::Http { status, .. } => Some(*status),
            ExchangeError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ExchangeError::Http { detail, .. } | ExchangeError::InvalidJson { detail, .. } => {
                Some(detail)
            }
            _ => None,
        }
    }

    /// Whether the provider rejected the principal as foreign to the tenant.
    pub fn is_tenant_rejection(&self) -> bool {
        self.detail()
            .is_some_and(|d| d.contains(TENANT_NOT_PROVISIONED))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to generate session identifier: {0}")]
    Entropy(getrandom::Error),
}

/// Every fault a route handler can surface to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Principal is not provisioned in the tenant: {detail}")]
    TenantAccessDenied { detail: String },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Classify an `error` / `error_description` pair the provider sent back
    /// to the callback instead of an authorization code.
    pub fn from_provider(error: &str, description: Option<&str>) -> Self {
        let detail = match description {
            Some(d) => format!("{error}: {d}"),
            None => error.to_string(),
        };
        if detail.contains(TENANT_NOT_PROVISIONED) {
            AppError::TenantAccessDenied { detail }
        } else {
            AppError::Authentication(detail)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TenantAccessDenied { .. } => StatusCode::FORBIDDEN,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Session(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            AppError::TenantAccessDenied { detail } => Some(detail),
            AppError::Authentication(detail) => Some(detail),
            _ => None,
        }
    }

    fn envelope(&self, status: StatusCode) -> ErrorEnvelope {
        match self {
            AppError::TenantAccessDenied { .. } => ErrorEnvelope::new(TENANT_ACCESS_DENIED_MESSAGE)
                .with_details(TENANT_ACCESS_DENIED_DETAILS)
                .with_code("TENANT_ACCESS_DENIED"),
            AppError::Authentication(detail) => ErrorEnvelope::new("Authentication failed")
                .with_details(detail.clone())
                .with_code("AUTH_FAILED"),
            other => ErrorEnvelope::new(other.to_string()).with_status(status),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), detail = ?self.detail(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), detail = ?self.detail(), "Request rejected");
        }
        (status, Json(self.envelope(status))).into_response()
    }
}

/// JSON error body: `{ "error": { "message": .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                details: None,
                code: None,
                status: None,
                timestamp: None,
            },
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error.details = Some(details.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.error.status = Some(status.as_u16());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.error.timestamp = Some(timestamp.into());
        self
    }
}
