//! OpenAI-compatible chat-completion client.

use crate::backend::{CompletionBackend, CompletionRequest, CompletionResponse};
use crate::error::{ClientSetupError, CompletionFailure};
use async_trait::async_trait;
use chat_relay_conversation::Turn;
use reqwest::header::ACCEPT;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Longest slice of an error body kept in a failure reason.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`ChatCompletionClient`].
#[derive(Clone)]
pub struct ClientSettings {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Static bearer credential.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Transport timeout for one request. `None` leaves the HTTP client's
    /// own default in place.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sends transcripts to an OpenAI-compatible `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl ChatCompletionClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: ClientSettings) -> Result<Self, ClientSetupError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientSetupError {
                reason: e.to_string(),
            })?;
        Ok(Self { http, settings })
    }
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    #[instrument(skip_all, fields(model = %self.settings.model, turns = turns.len()))]
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionFailure> {
        let request = CompletionRequest {
            model: &self.settings.model,
            messages: turns,
        };

        let response = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    endpoint = %self.settings.endpoint,
                    "HTTP error during completion request"
                );
                CompletionFailure::Transport {
                    status: None,
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                endpoint = %self.settings.endpoint,
                body = %truncate_body(&body),
                "Completion endpoint returned an error status"
            );
            return Err(CompletionFailure::Transport {
                status: Some(status.as_u16()),
                reason: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read completion response body");
            CompletionFailure::Transport {
                status: Some(status.as_u16()),
                reason: e.to_string(),
            }
        })?;

        let parsed: CompletionResponse = serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "Error in AI response");
            CompletionFailure::InvalidResponse {
                reason: e.to_string(),
            }
        })?;

        let reply = parsed.into_reply().inspect_err(|e| {
            error!(error = %e, "Error in AI response");
        })?;
        debug!(reply_chars = reply.chars().count(), "Received completion");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> ChatCompletionClient {
        ChatCompletionClient::new(ClientSettings {
            endpoint: format!("{base}/v1/chat/completions"),
            api_key: "TEST_KEY".to_string(),
            model: "test-model".to_string(),
            timeout: Some(Duration::from_secs(5)),
        })
        .expect("client")
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        }))
    }

    #[tokio::test]
    async fn sends_authenticated_request_with_full_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer TEST_KEY"))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi"},
                    {"role": "user", "content": "how are you?"}
                ]
            })))
            .respond_with(reply("fine"))
            .expect(1)
            .mount(&server)
            .await;

        let turns = vec![
            Turn::user("hello"),
            Turn::assistant("hi"),
            Turn::user("how are you?"),
        ];
        let result = client(&server.uri()).complete(&turns).await;
        assert_eq!(result, Ok("fine".to_string()));
    }

    #[tokio::test]
    async fn error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let result = client(&server.uri()).complete(&[Turn::user("hi")]).await;
        match result {
            Err(CompletionFailure::Transport { status, reason }) => {
                assert_eq!(status, Some(401));
                assert!(reason.contains("invalid api key"));
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_content_is_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply(""))
            .mount(&server)
            .await;

        let result = client(&server.uri()).complete(&[Turn::user("hi")]).await;
        assert_eq!(result, Err(CompletionFailure::EmptyReply));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client(&server.uri()).complete(&[Turn::user("hi")]).await;
        assert!(matches!(
            result,
            Err(CompletionFailure::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_failure() {
        // Reserve a free port, then release it so nothing is listening there.
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            format!("http://{}", listener.local_addr().expect("addr"))
        };

        let result = client(&uri).complete(&[Turn::user("hi")]).await;
        assert!(matches!(
            result,
            Err(CompletionFailure::Transport { status: None, .. })
        ));
    }

    #[test]
    fn settings_debug_redacts_key() {
        let settings = ClientSettings {
            endpoint: "https://api.example.com".to_string(),
            api_key: "sk-secret".to_string(),
            model: "m".to_string(),
            timeout: None,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY + 10);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY + 3);
    }
}
