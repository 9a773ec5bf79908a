use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Hive API error: {0}")]
    HiveApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("2FA not supported: account requires an SMS challenge")]
    TwoFactorRequired,

    #[error("Mapping error: {0}")]
    Mapping(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
