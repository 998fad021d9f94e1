use config::Config;
use sso_gateway::config::{AppConfig, ProviderConfig, load_config_from};

#[test]
fn test_app_config_deserialization() {
    let yaml_content = r#"
port: 8080
session_secret: "file-session-secret"
client_id: "11111111-2222-3333-4444-555555555555"
client_secret: "file-client-secret"
tenant_id: "contoso.onmicrosoft.com"
callback_url: "https://sso.example.com/auth/callback"
environment: "production"
authority_url: "https://login.microsoftonline.com"
graph_url: "https://graph.microsoft.com"
app_name: "Contoso SSO"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let app_config: AppConfig = config
        .try_deserialize()
        .expect("Failed to deserialize app config");
    assert_eq!(app_config.port, 8080);
    assert_eq!(
        app_config.client_id.as_deref(),
        Some("11111111-2222-3333-4444-555555555555")
    );
    assert_eq!(
        app_config.tenant_id.as_deref(),
        Some("contoso.onmicrosoft.com")
    );
    assert!(app_config.is_production());
    assert!(app_config.warnings().is_empty());

    let provider = ProviderConfig::from_app_config(&app_config);
    assert_eq!(
        provider.authorize_url,
        "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/authorize"
    );
    assert_eq!(provider.redirect_uri, "https://sso.example.com/auth/callback");
}

#[test]
fn test_optional_provider_fields_may_be_absent() {
    let yaml_content = r#"
port: 3000
session_secret: "s"
client_secret: "c"
callback_url: "http://localhost:3000/auth/callback"
environment: "development"
authority_url: "https://login.microsoftonline.com"
graph_url: "https://graph.microsoft.com"
app_name: "SSO"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let app_config: AppConfig = config.try_deserialize().expect("Failed to deserialize");
    assert!(app_config.client_id.is_none());
    assert!(app_config.tenant_id.is_none());
}

#[test]
fn test_config_partial_structure() {
    let invalid_yaml = r#"
port: 3000
# Missing secrets, URLs and environment
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            invalid_yaml,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let result: Result<AppConfig, _> = config.try_deserialize();
    assert!(
        result.is_err(),
        "Should fail when required fields are missing"
    );
}

#[test]
fn test_invalid_port_is_rejected() {
    let vars = [("PORT", "not-a-port")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert!(load_config_from(vars).is_err());
}

#[test]
fn test_non_production_modes_are_development() {
    for mode in ["development", "staging", "test", "Production"] {
        let vars = [("ENVIRONMENT", mode)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = load_config_from(vars).expect("load config");
        assert!(!config.is_production(), "{mode} must not enable secure cookies");
    }
}
