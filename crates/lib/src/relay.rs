//! Relay pipeline: one inbound chat event becomes one outbound chat reply.
//!
//! The bot token and the model reply are independent, so they are fetched concurrently;
//! dispatch needs both. The first failure aborts the rest, nothing is retried.

use crate::config::Config;
use crate::llm::{CompletionError, OpenAiClient};
use crate::zoom::{
    AccessToken, AuthError, ClientCredentials, DispatchError, InboundChatEvent, RoutingTarget,
    ZoomChatClient, ZoomOAuthClient,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Obtains a bearer credential for the chat API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self, credentials: &ClientCredentials) -> Result<AccessToken, AuthError>;
}

/// Turns a user utterance into a reply.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError>;
}

/// Delivers a reply to the conversation named by `routing`.
#[async_trait]
pub trait ChatDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        original_text: &str,
        reply_text: &str,
        token: &AccessToken,
        routing: &RoutingTarget,
    ) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Drives token → completion → dispatch for each inbound event. Holds no per-request state.
#[derive(Clone)]
pub struct Relay {
    credentials: Option<ClientCredentials>,
    tokens: Arc<dyn TokenProvider>,
    completer: Arc<dyn Completer>,
    dispatcher: Arc<dyn ChatDispatcher>,
}

impl Relay {
    pub fn new(
        credentials: Option<ClientCredentials>,
        tokens: Arc<dyn TokenProvider>,
        completer: Arc<dyn Completer>,
        dispatcher: Arc<dyn ChatDispatcher>,
    ) -> Self {
        Self {
            credentials,
            tokens,
            completer,
            dispatcher,
        }
    }

    /// Relay wired to the real Zoom and OpenAI endpoints from config.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.http.timeout();
        let zoom = &config.zoom;
        let openai = &config.openai;
        Self::new(
            ClientCredentials::from_config(zoom),
            Arc::new(ZoomOAuthClient::new(&zoom.api_base_url, timeout)),
            Arc::new(OpenAiClient::new(
                Some(openai.base_url.clone()),
                openai.api_key.clone(),
                &openai.model,
                openai.max_tokens,
                timeout,
            )),
            Arc::new(ZoomChatClient::new(
                &zoom.api_base_url,
                zoom.bot_jid.clone(),
                &zoom.bot_name,
                timeout,
            )),
        )
    }

    /// Run the pipeline for one event. Ok only once the reply has been delivered.
    pub async fn handle(&self, event: &InboundChatEvent) -> Result<(), RelayError> {
        let credentials = self.credentials.as_ref().ok_or(AuthError::NotConfigured)?;
        let (token, reply) = tokio::try_join!(
            async {
                self.tokens
                    .fetch_token(credentials)
                    .await
                    .map_err(RelayError::from)
            },
            async {
                self.completer
                    .complete(&event.cmd)
                    .await
                    .map_err(RelayError::from)
            },
        )?;
        log::debug!("relay: reply generated ({} chars)", reply.len());
        self.dispatcher
            .dispatch(&event.cmd, &reply, &token, &event.routing)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        tokens: Mutex<usize>,
        completions: Mutex<Vec<String>>,
        dispatched: Mutex<Vec<(String, String, AccessToken, RoutingTarget)>>,
    }

    struct FakeTokens {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl TokenProvider for FakeTokens {
        async fn fetch_token(&self, c: &ClientCredentials) -> Result<AccessToken, AuthError> {
            *self.calls.tokens.lock().unwrap() += 1;
            if self.fail {
                return Err(AuthError::Api("401 invalid client".to_string()));
            }
            Ok(AccessToken::new(format!("tok-for-{}", c.client_id)))
        }
    }

    struct FakeCompleter {
        calls: Arc<Calls>,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl Completer for FakeCompleter {
        async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
            self.calls.completions.lock().unwrap().push(user_text.to_string());
            self.reply.map(str::to_string).ok_or(CompletionError::Empty)
        }
    }

    struct FakeDispatcher {
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl ChatDispatcher for FakeDispatcher {
        async fn dispatch(
            &self,
            original_text: &str,
            reply_text: &str,
            token: &AccessToken,
            routing: &RoutingTarget,
        ) -> Result<(), DispatchError> {
            self.calls.dispatched.lock().unwrap().push((
                original_text.to_string(),
                reply_text.to_string(),
                token.clone(),
                routing.clone(),
            ));
            Ok(())
        }
    }

    fn relay(calls: &Arc<Calls>, token_fails: bool, reply: Option<&'static str>) -> Relay {
        Relay::new(
            Some(ClientCredentials::new("id", "secret")),
            Arc::new(FakeTokens {
                calls: calls.clone(),
                fail: token_fails,
            }),
            Arc::new(FakeCompleter {
                calls: calls.clone(),
                reply,
            }),
            Arc::new(FakeDispatcher {
                calls: calls.clone(),
            }),
        )
    }

    fn island() -> InboundChatEvent {
        InboundChatEvent {
            cmd: "island".to_string(),
            routing: RoutingTarget {
                to_jid: "u1".to_string(),
                account_id: "a1".to_string(),
                user_jid: "u2".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn success_dispatches_reply_to_inbound_routing() {
        let calls = Arc::new(Calls::default());
        relay(&calls, false, Some("Here is an island photo."))
            .handle(&island())
            .await
            .unwrap();

        assert_eq!(*calls.completions.lock().unwrap(), vec!["island".to_string()]);
        let dispatched = calls.dispatched.lock().unwrap();
        assert_eq!(dispatched.len(), 1);
        let (original, reply, token, routing) = &dispatched[0];
        assert_eq!(original, "island");
        assert_eq!(reply, "Here is an island photo.");
        assert_eq!(token.secret(), "tok-for-id");
        assert_eq!(routing, &island().routing);
    }

    #[tokio::test]
    async fn token_failure_skips_dispatch() {
        let calls = Arc::new(Calls::default());
        let err = relay(&calls, true, Some("unused"))
            .handle(&island())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Auth(_)));
        assert!(calls.dispatched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn completion_failure_skips_dispatch() {
        let calls = Arc::new(Calls::default());
        let err = relay(&calls, false, None).handle(&island()).await.unwrap_err();
        assert!(matches!(err, RelayError::Completion(CompletionError::Empty)));
        assert!(calls.dispatched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_call() {
        let calls = Arc::new(Calls::default());
        let mut r = relay(&calls, false, Some("x"));
        r.credentials = None;
        let err = r.handle(&island()).await.unwrap_err();
        assert!(matches!(err, RelayError::Auth(AuthError::NotConfigured)));
        assert_eq!(*calls.tokens.lock().unwrap(), 0);
        assert!(calls.completions.lock().unwrap().is_empty());
        assert!(calls.dispatched.lock().unwrap().is_empty());
    }
}
