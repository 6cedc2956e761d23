//! Identity provider client
//!
//! Exchanges the short-lived session id handed out by the external OAuth
//! provider for the user's profile and a session token. One GET per
//! exchange, no retries, bounded by the configured timeout.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::AuthConfig;

/// Header carrying the provider session id
pub const SESSION_ID_HEADER: &str = "X-Session-ID";

/// Profile returned by the identity provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Error types for identity exchange
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered but refused the session id
    #[error("Identity provider rejected session: {0}")]
    Rejected(String),

    /// The provider could not be reached or returned garbage
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Exchange endpoint of an external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange(&self, session_id: &str) -> Result<ProviderIdentity, IdentityError>;
}

/// reqwest-backed provider client
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        Self::new(
            config.provider_url.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        )
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange(&self, session_id: &str) -> Result<ProviderIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.url)
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Unavailable("request timed out".to_string())
                } else {
                    IdentityError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(IdentityError::Rejected(format!(
                "provider returned {}",
                status.as_u16()
            )));
        }

        response
            .json::<ProviderIdentity>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed provider response: {}", e)))
    }
}
