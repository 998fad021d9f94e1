use crate::config::ProviderConfig;
use crate::error::{ExchangeError, Upstream};
use crate::oauth2::profile::{Profile, UserRecord};
use serde::Deserialize;
use url::form_urlencoded;

/// Token endpoint response for the authorization-code grant.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Only issued when `offline_access` was granted.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth2 client for the configured tenant.
///
/// Outbound calls are never retried and carry no timeout beyond the HTTP
/// client's defaults.
#[derive(Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build the URL the browser is sent to for sign-in.
    ///
    /// No validation happens here: with an empty client id or tenant the URL
    /// is still produced and the provider rejects it.
    pub fn authorization_url(&self, csrf_state: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope())
            .append_pair("state", csrf_state)
            .append_pair("prompt", "select_account")
            .finish();
        format!("{}?{}", self.config.authorize_url, query)
    }

    /// Exchange an authorization code at the token endpoint.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ExchangeError> {
        let scope = self.config.scope();
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|source| ExchangeError::Transport {
                upstream: Upstream::Token,
                source,
            })?;

        read_json(Upstream::Token, response).await
    }

    /// Fetch the signed-in user's profile with `access_token` as bearer.
    #[tracing::instrument(skip_all)]
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ExchangeError> {
        tracing::debug!(url = %self.config.profile_url, "Fetching user profile");
        let response = self
            .http
            .get(&self.config.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| ExchangeError::Transport {
                upstream: Upstream::Profile,
                source,
            })?;

        read_json(Upstream::Profile, response).await
    }

    /// Complete a login: exchange the code, fetch the profile and build the
    /// user record.
    pub async fn authenticate(&self, code: &str) -> Result<UserRecord, ExchangeError> {
        let tokens = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;
        let user = UserRecord::from_profile(profile, tokens)?;
        tracing::info!(email = %user.email, "Successfully authenticated user");
        Ok(user)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    upstream: Upstream,
    response: reqwest::Response,
) -> Result<T, ExchangeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ExchangeError::Transport { upstream, source })?;

    if !status.is_success() {
        return Err(ExchangeError::Http {
            upstream,
            status,
            detail: body,
        });
    }

    serde_json::from_str(&body).map_err(|e| ExchangeError::InvalidJson {
        upstream,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, load_config_from};

    fn provider(pairs: &[(&str, &str)]) -> ProviderClient {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config: AppConfig = load_config_from(vars).unwrap();
        ProviderClient::new(ProviderConfig::from_app_config(&config))
    }

    #[test]
    fn authorization_url_carries_oauth_parameters() {
        let client = provider(&[("CLIENT_ID", "client-123"), ("TENANT_ID", "contoso")]);
        let url = url::Url::parse(&client.authorization_url("csrf-token")).unwrap();

        assert_eq!(url.path(), "/contoso/oauth2/v2.0/authorize");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/auth/callback");
        assert_eq!(params["scope"], "openid profile email offline_access");
        assert_eq!(params["state"], "csrf-token");
        assert_eq!(params["prompt"], "select_account");
    }

    #[test]
    fn authorization_url_is_built_even_when_unconfigured() {
        let client = provider(&[]);
        let url = client.authorization_url("s");
        assert!(url.starts_with("https://login.microsoftonline.com//oauth2/v2.0/authorize?"));
        assert!(url.contains("client_id=&"));
    }
}
