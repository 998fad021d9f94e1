//! A thin authentication gateway.
//!
//! Unauthenticated browsers are sent to a single-tenant identity provider's
//! OAuth2 authorization endpoint. The returned authorization code is exchanged
//! for tokens, the user's profile is fetched from the profile API, and the
//! result is kept in a server-side session keyed by a signed cookie.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::{AppConfig, ProviderConfig};
use crate::oauth2::ProviderClient;
use crate::session::SessionStore;

pub mod api;
pub mod config;
pub mod error;
pub mod oauth2;
pub mod session;

/// Shared state for every route handler. Built once at startup; the
/// configuration inside never changes afterwards.
pub struct GatewayState<S> {
    pub config: Arc<AppConfig>,
    pub provider: Arc<ProviderClient>,
    pub sessions: Arc<S>,
    cookie_key: Key,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for GatewayState<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            provider: self.provider.clone(),
            sessions: self.sessions.clone(),
            cookie_key: self.cookie_key.clone(),
        }
    }
}

impl<S: SessionStore> GatewayState<S> {
    pub fn new(config: AppConfig, sessions: Arc<S>) -> Self {
        let provider = ProviderClient::new(ProviderConfig::from_app_config(&config));
        let cookie_key = session::signing_key(&config.session_secret);
        Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            sessions,
            cookie_key,
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.config.is_production()
    }
}

// SignedCookieJar requires Key to be extractable from state
impl<S> FromRef<GatewayState<S>> for Key {
    fn from_ref(state: &GatewayState<S>) -> Self {
        state.cookie_key.clone()
    }
}
