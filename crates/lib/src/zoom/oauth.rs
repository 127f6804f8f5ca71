//! OAuth client-credentials grant against the Zoom token endpoint.

use crate::relay::TokenProvider;
use crate::zoom::ClientCredentials;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Short-lived bearer credential for the chat API. Obtained per relay, never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("zoom oauth credentials not configured")]
    NotConfigured,
    #[error("zoom oauth request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("zoom oauth api error: {0}")]
    Api(String),
    #[error("zoom oauth response not understood: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for `POST /oauth/token?grant_type=client_credentials`.
#[derive(Clone)]
pub struct ZoomOAuthClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ZoomOAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Exchange the app's client credentials for a chatbot token.
    pub async fn fetch_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<AccessToken, AuthError> {
        let url = format!("{}/oauth/token?grant_type=client_credentials", self.base_url);
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, credentials.basic_auth_header())
            .timeout(self.timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Api(format!("{} {}", status, body)));
        }
        let body = res.text().await?;
        let data: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;
        Ok(AccessToken(data.access_token))
    }
}

#[async_trait]
impl TokenProvider for ZoomOAuthClient {
    async fn fetch_token(&self, credentials: &ClientCredentials) -> Result<AccessToken, AuthError> {
        ZoomOAuthClient::fetch_token(self, credentials).await
    }
}
