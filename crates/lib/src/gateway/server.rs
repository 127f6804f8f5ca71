//! Gateway HTTP server.

use crate::config::Config;
use crate::gateway::pages;
use crate::relay::Relay;
use crate::zoom::{
    ChatWebhook, ClientCredentials, ComplianceNotice, ComplianceNotifier, DeauthorizationWebhook,
    ZoomComplianceClient,
};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway handlers. Cloned per request; holds no per-request data.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub relay: Relay,
    /// Receives compliance notices after a successful deauthorization.
    pub compliance: Arc<dyn ComplianceNotifier>,
}

impl GatewayState {
    /// State wired to the real upstream clients described by `config`.
    pub fn from_config(config: Config) -> Self {
        let relay = Relay::from_config(&config);
        let compliance = Arc::new(ZoomComplianceClient::new(
            &config.zoom.api_base_url,
            ClientCredentials::from_config(&config.zoom),
            config.http.timeout(),
        ));
        Self {
            config: Arc::new(config),
            relay,
            compliance,
        }
    }
}

/// All routes. Exposed separately from [`run_gateway`] so tests can serve it with fakes.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(|| async { pages::HOME }))
        .route("/authorize", get(authorize))
        .route("/support", get(|| async { pages::SUPPORT }))
        .route("/privacy", get(|| async { pages::PRIVACY }))
        .route("/terms", get(|| async { pages::TERMS }))
        .route("/documentation", get(|| async { pages::DOCUMENTATION }))
        .route("/zoomverify/verifyzoom.html", get(verify_zoom))
        .route("/health", get(health_http))
        .route("/unsplash", post(unsplash))
        .route("/deauthorize", post(deauthorize))
        .with_state(state)
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    let port = config.gateway.port;
    if ClientCredentials::from_config(&config.zoom).is_none() {
        log::warn!("zoom client id/secret not set; relays and compliance notices will fail");
    }
    if config.zoom.verification_token.is_none() {
        log::warn!("zoom verification token not set; every deauthorization request will be rejected");
    }
    if config.openai.api_key.is_none() {
        log::warn!("OPENAI_API_KEY not set; relays will fail");
    }

    let app = router(GatewayState::from_config(config));

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("Unsplash Chatbot for Zoom listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /authorize — send the installer to the chat client with the bot opened.
async fn authorize(State(state): State<GatewayState>) -> Response {
    log::info!("authorized");
    let zoom = &state.config.zoom;
    let jid = zoom.bot_jid.as_deref().unwrap_or_default();
    let location = format!("{}?jid=robot_{}", zoom.launch_url, jid);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// GET /zoomverify/verifyzoom.html — domain verification code.
async fn verify_zoom(State(state): State<GatewayState>) -> String {
    state
        .config
        .zoom
        .verification_code
        .clone()
        .unwrap_or_default()
}

/// GET /health returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// POST /unsplash — chatbot command webhook. 200 once the reply is delivered, 500 if any step fails.
async fn unsplash(
    State(state): State<GatewayState>,
    Json(webhook): Json<ChatWebhook>,
) -> StatusCode {
    let event = webhook.payload;
    log::info!("relay: command received for account {}", event.routing.account_id);
    match state.relay.handle(&event).await {
        Ok(()) => {
            log::info!("relay: reply sent to {}", event.routing.to_jid);
            StatusCode::OK
        }
        Err(e) => {
            log::error!("relay failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// POST /deauthorize — verify the shared secret, acknowledge, then send the compliance
/// notice in the background. The notice's outcome never reaches the caller.
async fn deauthorize(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let expected = state.config.zoom.verification_token.as_deref();
    let authorized = matches!((provided, expected), (Some(p), Some(e)) if p == e);
    if !authorized {
        log::warn!("deauthorize: verification token mismatch");
        return (StatusCode::UNAUTHORIZED, pages::UNAUTHORIZED).into_response();
    }
    let webhook: DeauthorizationWebhook = match serde_json::from_slice(&body) {
        Ok(w) => w,
        Err(e) => {
            log::warn!("deauthorize: malformed body: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    spawn_compliance_notice(
        state.compliance.clone(),
        ComplianceNotice::completed(webhook.payload),
    );
    StatusCode::OK.into_response()
}

/// Fire-and-forget: the handler has already answered, so failures are only logged.
fn spawn_compliance_notice(notifier: Arc<dyn ComplianceNotifier>, notice: ComplianceNotice) {
    tokio::spawn(async move {
        match notifier.notify(&notice).await {
            Ok(body) => log::info!("compliance notice accepted: {}", body),
            Err(e) => log::error!("compliance notice failed: {}", e),
        }
    });
}
