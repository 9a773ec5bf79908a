//! Hive REST API Client
//!
//! This module provides the authenticated client for the Hive "beekeeper" API.
//!
//! # Architecture
//!
//! - **Authentication**: Cognito SRP login once at startup, see [`super::auth`]
//! - **Requests**: plain HTTPS GETs carrying the id token in the
//!   `authorization` header; every response body is JSON
//! - **Refresh**: [`HiveApi::refresh_tokens`] is called at the start of each
//!   poll cycle and only contacts Cognito when the id token is about to expire
//!
//! The poll cycle only sees the [`HiveApi`] trait, so tests can substitute a
//! scripted implementation.

use crate::config::{Credentials, HiveConfig};
use crate::error::{ExporterError, Result};
use crate::hive::auth::{self, CognitoAuth, CognitoPool, Tokens};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Operations the poll cycle needs from the Hive API
pub trait HiveApi: Send + Sync {
    /// Base URL the endpoint templates are resolved against.
    fn base_url(&self) -> &str;

    /// Make sure the session tokens are valid for the next requests.
    fn refresh_tokens(&self) -> impl Future<Output = Result<()>> + Send;

    /// Issue one request and decode the body as JSON.
    fn request(&self, method: Method, url: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// Client for the Hive REST API
///
/// Holds the session tokens behind a `RwLock` so requests can share the
/// client while a refresh swaps the tokens.
pub struct HiveClient {
    http: reqwest::Client,
    base_url: String,
    auth: CognitoAuth,
    tokens: RwLock<Tokens>,
}

impl HiveClient {
    /// Authenticate with Hive and return a ready client.
    ///
    /// The Cognito pool is discovered from the SSO page unless both
    /// `cognito_pool_id` and `cognito_client_id` are configured.
    ///
    /// # Errors
    ///
    /// - [`ExporterError::TwoFactorRequired`] if the account has SMS 2FA enabled
    /// - [`ExporterError::Auth`] if Cognito rejects the credentials or returns
    ///   no authentication result
    pub async fn login(config: &HiveConfig, credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let pool = match (&config.cognito_pool_id, &config.cognito_client_id) {
            (Some(pool_id), Some(client_id)) => CognitoPool::new(pool_id, client_id)?,
            _ => auth::discover_pool(&http, &config.sso_url).await?,
        };

        let auth = CognitoAuth::connect(
            pool,
            config.cognito_endpoint.as_deref(),
            Duration::from_secs(config.request_timeout_seconds),
        )
        .await;
        let tokens = auth
            .login(&credentials.username, &credentials.password)
            .await?;
        info!("Authenticated with Hive");

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth,
            tokens: RwLock::new(tokens),
        })
    }
}

impl HiveApi for HiveClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn refresh_tokens(&self) -> Result<()> {
        if !self.tokens.read().await.expires_soon() {
            debug!("Session tokens still valid");
            return Ok(());
        }

        let mut tokens = self.tokens.write().await;
        // Another caller may have refreshed while we waited for the lock
        if tokens.expires_soon() {
            *tokens = self.auth.refresh(&tokens).await?;
            info!("Refreshed Hive session tokens");
        }
        Ok(())
    }

    async fn request(&self, method: Method, url: &str) -> Result<Value> {
        debug!("{} {}", method, url);

        let id_token = self.tokens.read().await.id_token.clone();
        let response = self
            .http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::AUTHORIZATION, id_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::HiveApi(format!("{status} from {url}")));
        }

        Ok(response.json().await?)
    }
}
