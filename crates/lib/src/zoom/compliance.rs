//! Data-compliance acknowledgment: after an app is deauthorized, Zoom expects the app
//! to confirm it has removed the user's data via POST /oauth/data/compliance.

use crate::zoom::ClientCredentials;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error("zoom oauth credentials not configured")]
    NotConfigured,
    #[error("zoom compliance request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("zoom compliance api error: {0}")]
    Api(String),
}

/// Body of the compliance call. Ids are taken from the deauthorization payload, which is
/// also echoed back whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceNotice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub deauthorization_event_received: Map<String, Value>,
    pub compliance_completed: bool,
}

impl ComplianceNotice {
    /// Completed-compliance notice for one deauthorization payload.
    pub fn completed(payload: Map<String, Value>) -> Self {
        let field = |k: &str| payload.get(k).and_then(|v| v.as_str()).map(str::to_string);
        let (client_id, user_id, account_id) =
            (field("client_id"), field("user_id"), field("account_id"));
        Self {
            client_id,
            user_id,
            account_id,
            deauthorization_event_received: payload,
            compliance_completed: true,
        }
    }
}

/// Sends compliance notices. Returns the endpoint's response body for logging.
#[async_trait]
pub trait ComplianceNotifier: Send + Sync {
    async fn notify(&self, notice: &ComplianceNotice) -> Result<String, ComplianceError>;
}

/// Client for `POST /oauth/data/compliance` (Basic auth, same credentials as the token grant).
#[derive(Clone)]
pub struct ZoomComplianceClient {
    base_url: String,
    credentials: Option<ClientCredentials>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ZoomComplianceClient {
    pub fn new(base_url: &str, credentials: Option<ClientCredentials>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ComplianceNotifier for ZoomComplianceClient {
    async fn notify(&self, notice: &ComplianceNotice) -> Result<String, ComplianceError> {
        let credentials = self.credentials.as_ref().ok_or(ComplianceError::NotConfigured)?;
        let url = format!("{}/oauth/data/compliance", self.base_url);
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, credentials.basic_auth_header())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(notice)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ComplianceError::Api(format!("{} {}", status, body)));
        }
        Ok(body)
    }
}
