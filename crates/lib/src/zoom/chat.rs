//! Chatbot message delivery: POST /v2/im/chat/messages with the bot token.

use crate::relay::ChatDispatcher;
use crate::zoom::{AccessToken, RoutingTarget};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("zoom bot jid not configured")]
    NotConfigured,
    #[error("zoom chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("zoom chat api error: {0}")]
    Api(String),
}

/// Body text of a relayed reply: echo of the user's command, blank line, model reply.
pub fn compose_reply_text(original: &str, reply: &str) -> String {
    format!("You said: {}\n\n{}", original, reply)
}

/// Chatbot message payload as accepted by the Zoom chat API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundChatMessage {
    pub robot_jid: String,
    pub to_jid: String,
    pub account_id: String,
    pub user_jid: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageContent {
    pub head: MessageHead,
    pub body: Vec<MessageBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageHead {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBlock {
    #[serde(rename = "type")]
    pub typ: String,
    pub text: String,
}

impl OutboundChatMessage {
    /// Single "message" block under a fixed header; routing copied from the inbound event.
    pub fn reply(
        robot_jid: &str,
        bot_name: &str,
        original: &str,
        reply: &str,
        routing: &RoutingTarget,
    ) -> Self {
        Self {
            robot_jid: robot_jid.to_string(),
            to_jid: routing.to_jid.clone(),
            account_id: routing.account_id.clone(),
            user_jid: routing.user_jid.clone(),
            content: MessageContent {
                head: MessageHead {
                    text: bot_name.to_string(),
                },
                body: vec![MessageBlock {
                    typ: "message".to_string(),
                    text: compose_reply_text(original, reply),
                }],
            },
        }
    }
}

/// Client for the chatbot messages endpoint.
#[derive(Clone)]
pub struct ZoomChatClient {
    base_url: String,
    robot_jid: Option<String>,
    bot_name: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ZoomChatClient {
    pub fn new(
        base_url: &str,
        robot_jid: Option<String>,
        bot_name: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            robot_jid,
            bot_name: bot_name.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Send a prepared message with Bearer auth.
    pub async fn send(
        &self,
        message: &OutboundChatMessage,
        token: &AccessToken,
    ) -> Result<(), DispatchError> {
        let url = format!("{}/v2/im/chat/messages", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(token.secret())
            .json(message)
            .timeout(self.timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DispatchError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatDispatcher for ZoomChatClient {
    async fn dispatch(
        &self,
        original_text: &str,
        reply_text: &str,
        token: &AccessToken,
        routing: &RoutingTarget,
    ) -> Result<(), DispatchError> {
        let robot_jid = self.robot_jid.as_deref().ok_or(DispatchError::NotConfigured)?;
        let message =
            OutboundChatMessage::reply(robot_jid, &self.bot_name, original_text, reply_text, routing);
        self.send(&message, token).await
    }
}
