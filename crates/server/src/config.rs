use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
/// Unsafe outside local development; deployments must set `SESSION_SECRET`.
pub const DEFAULT_SESSION_SECRET: &str = "your-session-secret";
/// Placeholder only; deployments must set `CLIENT_SECRET`.
pub const DEFAULT_CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3000/auth/callback";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";
pub const DEFAULT_APP_NAME: &str = "SSO Gateway";

/// Scopes requested on every authorization request.
pub const SCOPES: [&str; 4] = ["openid", "profile", "email", "offline_access"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
}

/// Raw settings as read from defaults, `config.yaml` and the environment.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub session_secret: String,
    #[serde(default)]
    pub client_id: Option<String>,
    pub client_secret: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub callback_url: String,
    /// Runtime mode. Anything other than `production` is treated as development.
    pub environment: String,
    /// Identity provider host; the tenant path is appended to it.
    pub authority_url: String,
    /// Base URL of the profile API.
    pub graph_url: String,
    /// Shown on the login page.
    pub app_name: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("callback_url", &self.callback_url)
            .field("environment", &self.environment)
            .field("authority_url", &self.authority_url)
            .field("graph_url", &self.graph_url)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Settings the deployment is responsible for overriding.
    ///
    /// Nothing here is fatal: a missing client id or tenant produces an
    /// authorization URL the provider rejects, which is where the failure
    /// surfaces.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.client_id.is_none() {
            warnings.push("CLIENT_ID is not set; the provider will reject authorization requests");
        }
        if self.tenant_id.is_none() {
            warnings.push("TENANT_ID is not set; provider endpoints will be malformed");
        }
        if self.client_secret == DEFAULT_CLIENT_SECRET {
            warnings.push("CLIENT_SECRET is using the placeholder default");
        }
        if self.session_secret == DEFAULT_SESSION_SECRET {
            warnings.push("SESSION_SECRET is using the built-in default; session cookies are forgeable");
        }
        warnings
    }
}

/// Provider endpoints and credentials, derived once from [`AppConfig`].
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("profile_url", &self.profile_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let tenant_id = config.tenant_id.clone().unwrap_or_default();
        let authority = config.authority_url.trim_end_matches('/');
        let graph = config.graph_url.trim_end_matches('/');

        Self {
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone(),
            authorize_url: format!("{authority}/{tenant_id}/oauth2/v2.0/authorize"),
            token_url: format!("{authority}/{tenant_id}/oauth2/v2.0/token"),
            profile_url: format!("{graph}/v1.0/me"),
            redirect_uri: config.callback_url.clone(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            tenant_id,
        }
    }

    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Load application configuration from defaults, an optional `config.yaml`,
/// and the process environment (`PORT`, `SESSION_SECRET`, `CLIENT_ID`, ...).
///
/// Environment variables win over the file; empty variables are ignored so
/// `CLIENT_ID=` behaves like an unset variable.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    build(config::Environment::default())
}

/// Same as [`load_config`] but reads variables from `vars` instead of the
/// process environment.
pub fn load_config_from(vars: config::Map<String, String>) -> Result<AppConfig, ConfigError> {
    build(config::Environment::default().source(Some(vars)))
}

fn build(env: config::Environment) -> Result<AppConfig, ConfigError> {
    use config::{Config, File};
    let cfg = Config::builder()
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("session_secret", DEFAULT_SESSION_SECRET)?
        .set_default("client_secret", DEFAULT_CLIENT_SECRET)?
        .set_default("callback_url", DEFAULT_CALLBACK_URL)?
        .set_default("environment", DEFAULT_ENVIRONMENT)?
        .set_default("authority_url", DEFAULT_AUTHORITY_URL)?
        .set_default("graph_url", DEFAULT_GRAPH_URL)?
        .set_default("app_name", DEFAULT_APP_NAME)?
        .add_source(File::with_name("config").required(false))
        .add_source(env.ignore_empty(true))
        .build()?;

    Ok(cfg.try_deserialize()?)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
