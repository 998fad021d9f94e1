use sso_gateway::GatewayState;
use sso_gateway::api::start_webserver;
use sso_gateway::config::{ProviderConfig, load_config_or_panic};
use sso_gateway::session::MemorySessionStore;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_standard_tracing() {
    let default_directives = "sso_gateway=info,tower_http=info,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env file is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    initialize_standard_tracing();
    if let Err(e) = &dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "Failed to read .env file");
        }
    }

    let config = load_config_or_panic();
    let provider = ProviderConfig::from_app_config(&config);

    tracing::info!(environment = %config.environment, "Environment");
    tracing::info!(
        client_id = %provider.client_id,
        tenant_id = %provider.tenant_id,
        callback_url = %provider.redirect_uri,
        "Identity provider configuration"
    );
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    let port = config.port;
    let state = GatewayState::new(config, Arc::new(MemorySessionStore::new()));

    start_webserver(state, port).await?;
    Ok(())
}
