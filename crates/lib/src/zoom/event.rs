//! Inbound webhook payloads from Zoom Team Chat.

use serde::Deserialize;

/// Where a chatbot message is delivered. Copied verbatim from the triggering event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingTarget {
    /// Destination conversation (channel or user) JID.
    pub to_jid: String,
    pub account_id: String,
    /// JID of the user who sent the command.
    pub user_jid: String,
}

/// A slash-command / chat event: the user's text plus routing identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundChatEvent {
    pub cmd: String,
    #[serde(flatten)]
    pub routing: RoutingTarget,
}

/// POST /unsplash body: `{ "payload": { "cmd", "toJid", "accountId", "userJid", ... } }`.
#[derive(Debug, Deserialize)]
pub struct ChatWebhook {
    pub payload: InboundChatEvent,
}

/// POST /deauthorize body. The payload is kept as raw JSON because it is echoed back
/// to the compliance endpoint unchanged.
#[derive(Debug, Deserialize)]
pub struct DeauthorizationWebhook {
    pub payload: serde_json::Map<String, serde_json::Value>,
}
