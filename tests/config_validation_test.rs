//! Configuration validation tests
//!
//! Tests that verify configuration defaults, credential checks and log levels.

use hive_exporter::config::{
    log_directive, Config, HiveConfig, PollingConfig, ProductMapping, ServerConfig,
};
use hive_exporter::error::ExporterError;
use secrecy::{ExposeSecret, SecretString};

/// Deserializes a `Config` from inline TOML.
fn config_from_toml(toml: &str) -> Config {
    config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()
        .expect("Failed to build configuration")
        .try_deserialize()
        .expect("Failed to deserialize configuration")
}

#[test]
fn test_default_server_config() {
    let config = ServerConfig::default();

    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 8888);
}

#[test]
fn test_default_polling_config() {
    let config = PollingConfig::default();

    assert_eq!(config.interval_seconds, 60);
    assert_eq!(config.product_mapping, ProductMapping::Trv);
    assert!(!config.collect_actions);
}

#[test]
fn test_default_hive_config() {
    let config = HiveConfig::default();

    assert_eq!(config.api_base_url, "https://beekeeper-uk.hivehome.com/1.0");
    assert_eq!(config.sso_url, "https://sso.hivehome.com/");
    assert_eq!(config.request_timeout_seconds, 30);
    assert!(config.username.is_none());
    assert!(config.password.is_none());
    assert!(config.cognito_client_id.is_none());
}

#[test]
fn test_empty_document_uses_defaults() {
    // Given: No settings at all
    let config = config_from_toml("");

    // Then: Every section falls back to its defaults
    assert_eq!(config.server.port, 8888);
    assert_eq!(config.polling.interval_seconds, 60);
    assert_eq!(config.polling.product_mapping, ProductMapping::Trv);
}

#[test]
fn test_product_mapping_parses_lowercase() {
    let config = config_from_toml(
        r#"
        [polling]
        product_mapping = "general"
        collect_actions = true
        "#,
    );

    assert_eq!(config.polling.product_mapping, ProductMapping::General);
    assert!(config.polling.collect_actions);
}

#[test]
fn test_unknown_product_mapping_is_rejected() {
    let result = config::Config::builder()
        .add_source(config::File::from_str(
            "[polling]\nproduct_mapping = \"heating\"",
            config::FileFormat::Toml,
        ))
        .build()
        .unwrap()
        .try_deserialize::<Config>();

    assert!(result.is_err());
}

#[test]
fn test_credentials_present() {
    let config = config_from_toml(
        r#"
        [hive]
        username = "user@example.com"
        password = "hunter2"
        "#,
    );

    let credentials = config.credentials().unwrap();
    assert_eq!(credentials.username, "user@example.com");
    assert_eq!(credentials.password.expose_secret(), "hunter2");
}

#[test]
fn test_missing_username_names_variable() {
    // Given: Only a password
    let mut config = config_from_toml("");
    config.hive.password = Some(SecretString::from("hunter2"));

    // When: Validating credentials
    let err = config.credentials().unwrap_err();

    // Then: The error names HIVE_USERNAME
    assert!(matches!(err, ExporterError::Config(_)));
    assert!(err.to_string().contains("HIVE_USERNAME"));
}

#[test]
fn test_missing_password_names_variable() {
    let mut config = config_from_toml("");
    config.hive.username = Some("user@example.com".to_string());

    let err = config.credentials().unwrap_err();
    assert!(err.to_string().contains("HIVE_PASSWORD"));
}

#[test]
fn test_username_checked_before_password() {
    let config = config_from_toml("");

    let err = config.credentials().unwrap_err();
    assert!(err.to_string().contains("HIVE_USERNAME"));
}

#[test]
fn test_password_is_redacted_in_debug_output() {
    let config = config_from_toml("[hive]\nusername = \"u\"\npassword = \"hunter2\"");

    let debug = format!("{:?}", config.hive);
    assert!(!debug.contains("hunter2"));
}

#[test]
fn test_log_directive() {
    assert_eq!(log_directive("INFO"), "info");
    assert_eq!(log_directive("debug"), "debug");
    assert_eq!(log_directive("WARNING"), "warn");
    assert_eq!(log_directive("Warn"), "warn");
    assert_eq!(log_directive("ERROR"), "error");
    assert_eq!(log_directive("CRITICAL"), "error");
    assert_eq!(log_directive(" trace "), "trace");
    assert_eq!(log_directive("verbose"), "info");
    assert_eq!(log_directive(""), "info");
}
