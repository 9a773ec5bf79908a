use crate::error::{ExporterError, Result};
use anyhow::Context;
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub hive: HiveConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HiveConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_sso_url")]
    pub sso_url: String,
    /// `{region}_{id}`; skips SSO discovery when set together with
    /// `cognito_client_id`
    #[serde(default)]
    pub cognito_pool_id: Option<String>,
    #[serde(default)]
    pub cognito_client_id: Option<String>,
    /// Overrides the regional Cognito endpoint
    #[serde(default)]
    pub cognito_endpoint: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_polling_interval")]
    pub interval_seconds: u64,
    #[serde(default)]
    pub product_mapping: ProductMapping,
    #[serde(default)]
    pub collect_actions: bool,
}

/// Which product mapping table the poll cycle applies.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProductMapping {
    /// Mode, brightness, target and the generic props of every non-TRV product
    General,
    /// Only `trvcontrol` products, exported under `hive_trv_*`
    #[default]
    Trv,
}

/// Username and password, validated as present.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

fn default_api_base_url() -> String {
    "https://beekeeper-uk.hivehome.com/1.0".to_string()
}

fn default_sso_url() -> String {
    "https://sso.hivehome.com/".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_polling_interval() -> u64 {
    60
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            api_base_url: default_api_base_url(),
            sso_url: default_sso_url(),
            cognito_pool_id: None,
            cognito_client_id: None,
            cognito_endpoint: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_polling_interval(),
            product_mapping: ProductMapping::default(),
            collect_actions: false,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("HIVE_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Returns the account credentials, or a configuration error naming the
    /// first missing variable.
    pub fn credentials(&self) -> Result<Credentials> {
        let username = self
            .hive
            .username
            .clone()
            .ok_or_else(|| {
                ExporterError::Config("HIVE_USERNAME environment variable is not set".to_string())
            })?;
        let password = self.hive.password.clone().ok_or_else(|| {
            ExporterError::Config("HIVE_PASSWORD environment variable is not set".to_string())
        })?;

        Ok(Credentials { username, password })
    }
}

/// Translates a `LOG_LEVEL` value into an `EnvFilter` directive.
///
/// Accepts tracing levels in any case plus the `WARNING`, `CRITICAL` and
/// `FATAL` spellings; anything unrecognised falls back to `info`.
pub fn log_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
    .to_string()
}
