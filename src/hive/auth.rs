//! Hive account authentication
//!
//! Hive accounts live in an AWS Cognito user pool. The pool and public client
//! id are published on the SSO landing page (`https://sso.hivehome.com/`) as
//! `window.HiveSSOPoolId` / `window.HiveSSOPublicCognitoClientId`; the region
//! is the pool id prefix (`eu-west-1_xxxx`).
//!
//! Login is the Cognito SRP exchange: `InitiateAuth(USER_SRP_AUTH)` returns a
//! `PASSWORD_VERIFIER` challenge, which is answered with
//! `RespondToAuthChallenge`. An `SMS_MFA` challenge in that answer is
//! reported as [`ExporterError::TwoFactorRequired`], since the exporter has no
//! way to respond to it. Refresh uses `InitiateAuth(REFRESH_TOKEN_AUTH)`.

use crate::error::{ExporterError, Result};
use aws_cognito_srp::{SrpClient, User};
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_cognitoidentityprovider::config::Region;
use aws_sdk_cognitoidentityprovider::error::ProvideErrorMetadata;
use aws_sdk_cognitoidentityprovider::types::{
    AuthFlowType, AuthenticationResultType, ChallengeNameType,
};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const POOL_ID_KEY: &str = "HiveSSOPoolId";
const CLIENT_ID_KEY: &str = "HiveSSOPublicCognitoClientId";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Used when Cognito reports a lifetime too large to represent.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Cognito user pool coordinates for the Hive SSO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoPool {
    pub pool_id: String,
    pub client_id: String,
    pub region: String,
}

impl CognitoPool {
    /// Derives the region from the `{region}_{id}` pool id.
    pub fn new(pool_id: &str, client_id: &str) -> Result<Self> {
        let region = pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
            .ok_or_else(|| ExporterError::Auth(format!("malformed pool id: {pool_id}")))?;

        Ok(Self {
            pool_id: pool_id.to_string(),
            client_id: client_id.to_string(),
            region: region.to_string(),
        })
    }
}

/// Fetch the SSO landing page and extract the Cognito pool from it.
pub async fn discover_pool(http: &reqwest::Client, sso_url: &str) -> Result<CognitoPool> {
    debug!("Discovering Cognito pool from {}", sso_url);
    let page = http.get(sso_url).send().await?.text().await?;
    parse_sso_page(&page)
}

/// Extract the pool id and client id from the SSO page source.
pub fn parse_sso_page(page: &str) -> Result<CognitoPool> {
    let pool_id = extract_assignment(page, POOL_ID_KEY)
        .ok_or_else(|| ExporterError::Auth(format!("{POOL_ID_KEY} not found on SSO page")))?;
    let client_id = extract_assignment(page, CLIENT_ID_KEY)
        .ok_or_else(|| ExporterError::Auth(format!("{CLIENT_ID_KEY} not found on SSO page")))?;

    CognitoPool::new(&pool_id, &client_id)
}

/// Finds `key = "value"` (single or double quotes) and returns `value`.
fn extract_assignment(source: &str, key: &str) -> Option<String> {
    let start = source.find(key)? + key.len();
    let rest = source[start..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Session tokens issued by Cognito
pub struct Tokens {
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    expires_at: Instant,
}

impl Tokens {
    pub fn new(id_token: SecretString, refresh_token: SecretString, expires_in: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(expires_in)
            .unwrap_or_else(|| now + MAX_TOKEN_LIFETIME);

        Self {
            id_token,
            refresh_token,
            expires_at,
        }
    }

    /// True once the tokens are within the refresh margin of expiring.
    pub fn expires_soon(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Turns an SDK error into an auth error carrying Cognito's code and message.
fn auth_error<E>(err: E) -> ExporterError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => ExporterError::Auth(format!("{code}: {message}")),
        (Some(code), None) => ExporterError::Auth(code.to_string()),
        _ => ExporterError::Auth(err.to_string()),
    }
}

fn id_token(result: &AuthenticationResultType) -> Result<SecretString> {
    result
        .id_token()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ExporterError::Auth("no id token issued".to_string()))
}

fn lifetime(result: &AuthenticationResultType) -> Duration {
    Duration::from_secs(u64::try_from(result.expires_in()).unwrap_or_default())
}

/// Cognito client for one user pool and app client id
pub struct CognitoAuth {
    client: CognitoClient,
    pool: CognitoPool,
}

impl CognitoAuth {
    /// Builds the SDK client for the pool's region.
    ///
    /// `endpoint` overrides the regional Cognito endpoint. Cognito calls
    /// are unsigned, and the SDK does not retry them.
    pub async fn connect(pool: CognitoPool, endpoint: Option<&str>, timeout: Duration) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(pool.region.clone()))
            .no_credentials()
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self {
            client: CognitoClient::new(&sdk_config),
            pool,
        }
    }

    /// Log in with username and password over SRP.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Tokens> {
        info!("Authenticating with Hive as {}", username);
        let srp_client = SrpClient::new(
            User::new(&self.pool.pool_id, username, password.expose_secret()),
            &self.pool.client_id,
            None,
        );
        let auth_parameters = srp_client.get_auth_parameters();

        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("USERNAME".into(), auth_parameters.username.clone().unwrap_or_else(|| username.to_string()));
        params.insert("SRP_A".into(), auth_parameters.a.clone());

        let challenge = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserSrpAuth)
            .client_id(&self.pool.client_id)
            .set_auth_parameters(Some(params))
            .send()
            .await
            .map_err(auth_error)?;

        if challenge.challenge_name() != Some(&ChallengeNameType::PasswordVerifier) {
            return Err(ExporterError::Auth(format!(
                "expected PASSWORD_VERIFIER challenge, got {:?}",
                challenge.challenge_name()
            )));
        }

        let challenge_params = challenge
            .challenge_parameters()
            .cloned()
            .unwrap_or_default();
        let param = |key: &str| {
            challenge_params
                .get(key)
                .cloned()
                .ok_or_else(|| ExporterError::Auth(format!("challenge is missing {key}")))
        };
        let user_id = param("USER_ID_FOR_SRP").or_else(|_| param("USERNAME"))?;
        let verification = srp_client
            .verify(
                &param("SECRET_BLOCK")?,
                &user_id,
                &param("SALT")?,
                &param("SRP_B")?,
            )
            .map_err(|e| ExporterError::Auth(format!("SRP verification failed: {e}")))?;

        let mut responses: HashMap<String, String> = HashMap::new();
        responses.insert(
            "PASSWORD_CLAIM_SECRET_BLOCK".into(),
            verification.password_claim_secret_block,
        );
        responses.insert(
            "PASSWORD_CLAIM_SIGNATURE".into(),
            verification.password_claim_signature,
        );
        responses.insert("TIMESTAMP".into(), verification.timestamp);
        responses.insert("USERNAME".into(), user_id);

        let auth = self
            .client
            .respond_to_auth_challenge()
            .challenge_name(ChallengeNameType::PasswordVerifier)
            .client_id(&self.pool.client_id)
            .set_session(challenge.session().map(str::to_string))
            .set_challenge_responses(Some(responses))
            .send()
            .await
            .map_err(auth_error)?;

        if auth.challenge_name() == Some(&ChallengeNameType::SmsMfa) {
            return Err(ExporterError::TwoFactorRequired);
        }

        let result = auth.authentication_result().ok_or_else(|| {
            let reason = match auth.challenge_name() {
                Some(challenge) => format!("unsupported challenge {}", challenge.as_str()),
                None => "authentication unsuccessful".to_string(),
            };
            ExporterError::Auth(reason)
        })?;
        let refresh_token = result
            .refresh_token()
            .map(SecretString::from)
            .ok_or_else(|| ExporterError::Auth("no refresh token issued".to_string()))?;

        Ok(Tokens::new(id_token(result)?, refresh_token, lifetime(result)))
    }

    /// Exchange a refresh token for a new id token.
    ///
    /// Cognito does not rotate the refresh token, so the current one is kept
    /// unless a new one is returned.
    pub async fn refresh(&self, current: &Tokens) -> Result<Tokens> {
        debug!("Refreshing Hive session tokens");
        let mut params: HashMap<String, String> = HashMap::new();
        params.insert(
            "REFRESH_TOKEN".into(),
            current.refresh_token.expose_secret().to_string(),
        );

        let auth = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .client_id(&self.pool.client_id)
            .set_auth_parameters(Some(params))
            .send()
            .await
            .map_err(auth_error)?;

        let result = auth
            .authentication_result()
            .ok_or_else(|| ExporterError::Auth("refresh returned no tokens".to_string()))?;
        let refresh_token = result
            .refresh_token()
            .map(SecretString::from)
            .unwrap_or_else(|| current.refresh_token.clone());

        Ok(Tokens::new(id_token(result)?, refresh_token, lifetime(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pool_from_sso_script() {
        let page = r#"<html><script>window.HiveSSOEnv="production",window.HiveSSOPoolId="eu-west-1_AbCdEf",window.HiveSSOPublicCognitoClientId="3rl4i0client"</script></html>"#;
        let pool = parse_sso_page(page).unwrap();
        assert_eq!(pool.pool_id, "eu-west-1_AbCdEf");
        assert_eq!(pool.region, "eu-west-1");
        assert_eq!(pool.client_id, "3rl4i0client");
    }

    #[test]
    fn parses_single_quoted_assignments_with_spaces() {
        let page = "window.HiveSSOPoolId = 'us-east-2_Pool'; window.HiveSSOPublicCognitoClientId = 'abc';";
        let pool = parse_sso_page(page).unwrap();
        assert_eq!(pool.region, "us-east-2");
        assert_eq!(pool.client_id, "abc");
    }

    #[test]
    fn missing_client_id_is_an_auth_error() {
        let err = parse_sso_page(r#"window.HiveSSOPoolId="eu-west-1_x""#).unwrap_err();
        assert!(matches!(err, ExporterError::Auth(_)));
    }

    #[test]
    fn pool_id_without_region_is_rejected() {
        assert!(CognitoPool::new("nounderscore", "client").is_err());
        assert!(CognitoPool::new("_abc", "client").is_err());
    }

    #[test]
    fn fresh_tokens_do_not_expire_soon() {
        let tokens = Tokens::new(
            SecretString::from("id"),
            SecretString::from("refresh"),
            Duration::from_secs(3600),
        );
        assert!(!tokens.expires_soon());
    }

    #[test]
    fn tokens_inside_margin_expire_soon() {
        let tokens = Tokens::new(
            SecretString::from("id"),
            SecretString::from("refresh"),
            Duration::from_secs(60),
        );
        assert!(tokens.expires_soon());
    }

    #[test]
    fn huge_lifetime_does_not_overflow() {
        let tokens = Tokens::new(
            SecretString::from("id"),
            SecretString::from("refresh"),
            Duration::MAX,
        );
        assert!(!tokens.expires_soon());
    }
}
