//! Zoom platform clients: OAuth client-credentials token, chatbot message delivery,
//! and the data-compliance acknowledgment sent after an app is deauthorized.

mod chat;
mod compliance;
mod event;
mod oauth;

pub use chat::{
    compose_reply_text, DispatchError, MessageBlock, MessageContent, MessageHead,
    OutboundChatMessage, ZoomChatClient,
};
pub use compliance::{ComplianceError, ComplianceNotice, ComplianceNotifier, ZoomComplianceClient};
pub use event::{ChatWebhook, DeauthorizationWebhook, InboundChatEvent, RoutingTarget};
pub use oauth::{AccessToken, AuthError, ZoomOAuthClient};

use crate::config::ZoomConfig;
use base64::Engine;
use std::fmt;

/// Zoom app client id / secret pair. Both the token endpoint and the compliance
/// endpoint authenticate with HTTP Basic built from these.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Credentials from config, or None when either half is missing.
    pub fn from_config(zoom: &ZoomConfig) -> Option<Self> {
        match (&zoom.client_id, &zoom.client_secret) {
            (Some(id), Some(secret)) => Some(Self::new(id.clone(), secret.clone())),
            _ => None,
        }
    }

    /// `Basic base64(client_id:client_secret)`.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
        )
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_header_encodes_id_and_secret() {
        let c = ClientCredentials::new("id", "secret");
        // base64("id:secret")
        assert_eq!(c.basic_auth_header(), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn debug_hides_secret() {
        let c = ClientCredentials::new("id", "hunter2");
        let s = format!("{:?}", c);
        assert!(s.contains("id"));
        assert!(!s.contains("hunter2"));
    }

    #[test]
    fn from_config_needs_both_halves() {
        let mut z = ZoomConfig::default();
        z.client_id = Some("id".to_string());
        assert!(ClientCredentials::from_config(&z).is_none());
        z.client_secret = Some("s".to_string());
        assert!(ClientCredentials::from_config(&z).is_some());
    }
}
