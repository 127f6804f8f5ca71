//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.unsplash-bot/config.json`) and environment.
//! Environment variables win over file values so a bare `.env` deployment works without a file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Zoom app credentials and endpoints.
    #[serde(default)]
    pub zoom: ZoomConfig,

    /// Completion service settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Outbound HTTP settings shared by all upstream clients.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 4000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; Zoom must be able to reach the webhooks).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    4000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Zoom app settings. Secrets are usually supplied through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomConfig {
    /// OAuth client id. Overridden by `zoom_client_id` env.
    pub client_id: Option<String>,
    /// OAuth client secret. Overridden by `zoom_client_secret` env.
    pub client_secret: Option<String>,
    /// Chatbot JID (without the `robot_` prefix used by the launch URL). Overridden by `zoom_bot_jid` env.
    pub bot_jid: Option<String>,
    /// Domain verification code served at /zoomverify/verifyzoom.html. Overridden by `zoom_verification_code` env.
    pub verification_code: Option<String>,
    /// Shared secret Zoom sends in the `authorization` header of deauthorization events. Overridden by `zoom_verification_token` env.
    pub verification_token: Option<String>,
    /// REST API base for OAuth, chat and compliance calls.
    #[serde(default = "default_zoom_api_base_url")]
    pub api_base_url: String,
    /// Client launch URL used by GET /authorize.
    #[serde(default = "default_zoom_launch_url")]
    pub launch_url: String,
    /// Header label shown on every chatbot message.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

fn default_zoom_api_base_url() -> String {
    "https://api.zoom.us".to_string()
}

fn default_zoom_launch_url() -> String {
    "https://zoom.us/launch/chat".to_string()
}

fn default_bot_name() -> String {
    "Unsplash".to_string()
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            bot_jid: None,
            verification_code: None,
            verification_token: None,
            api_base_url: default_zoom_api_base_url(),
            launch_url: default_zoom_launch_url(),
            bot_name: default_bot_name(),
        }
    }
}

/// Completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    /// API key. Overridden by OPENAI_API_KEY env.
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Completion model id; must support the legacy `/completions` endpoint.
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Cap on generated tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// Per-request timeout for every upstream call, in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Non-empty trimmed value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Env wins; otherwise the trimmed, non-empty config value.
fn env_or(name: &str, configured: &Option<String>) -> Option<String> {
    env_value(name).or_else(|| {
        configured
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Apply environment overrides (PORT, OPENAI_API_KEY, zoom_*) on top of file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(port) = env_value("PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.gateway.port = p,
            Err(_) => log::warn!("ignoring invalid PORT value: {}", port),
        }
    }
    config.openai.api_key = env_or("OPENAI_API_KEY", &config.openai.api_key);
    let zoom = &mut config.zoom;
    zoom.client_id = env_or("zoom_client_id", &zoom.client_id);
    zoom.client_secret = env_or("zoom_client_secret", &zoom.client_secret);
    zoom.bot_jid = env_or("zoom_bot_jid", &zoom.bot_jid);
    zoom.verification_code = env_or("zoom_verification_code", &zoom.verification_code);
    zoom.verification_token = env_or("zoom_verification_token", &zoom.verification_token);
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".unsplash-bot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path), then apply env overrides.
/// Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok(config)
}
