//! One logical conversational call over a persistent conversation identity.
//!
//! The client issues a streaming-mode chat request, buffers the response
//! body to completion, then decodes and aggregates it. The three call
//! variants differ only in prompt assembly; all protocol handling is shared
//! by [`DifyClient::send_chat`].

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::aggregate::{AggregatedResult, aggregate};
use crate::error::{DifyError, Result};
use crate::stream::decode_stream;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct DifyConfig {
    /// Service base URL, e.g. `https://api.dify.example/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// User tag sent with every request.
    pub user: String,
}

/// Outcome of one logical chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Concatenated answer text; `None` when the stream produced no content.
    pub answer: Option<String>,
    /// Full aggregated metadata (identity, usage, files).
    pub result: AggregatedResult,
    /// Wall-clock time for the call.
    pub elapsed: Duration,
}

/// Transport failure before elapsed time is attached.
enum Transport {
    Http(reqwest::Error),
    Api { status: u16, body: String },
}

/// Client for the Dify conversational API.
pub struct DifyClient {
    config: DifyConfig,
    http: reqwest::Client,
}

impl DifyClient {
    /// Create a new client.
    #[must_use]
    pub fn new(mut config: DifyConfig) -> Self {
        while config.base_url.ends_with('/') {
            let _ = config.base_url.pop();
        }
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Create a new client with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: DifyConfig, http: reqwest::Client) -> Self {
        let mut client = Self::new(config);
        client.http = http;
        client
    }

    /// Send one chat message, optionally continuing an existing conversation.
    ///
    /// On success returns the aggregated answer and metadata with the
    /// elapsed time; on any transport failure (connection error, non-2xx
    /// status, timeout) returns an error carrying the elapsed time up to the
    /// failure. Not retried.
    #[instrument(skip_all, fields(continuing = conversation_id.is_some()))]
    pub async fn send_chat(
        &self,
        query: &str,
        conversation_id: Option<&str>,
        timeout: Duration,
    ) -> Result<ChatOutcome> {
        let url = format!("{}/chat-messages", self.config.base_url);
        let mut payload = json!({
            "query": query,
            "user": self.config.user,
            "response_mode": "streaming",
            "inputs": {},
        });
        if let Some(id) = conversation_id {
            payload["conversation_id"] = json!(id);
        }

        let preview: String = query.chars().take(100).collect();
        debug!(query = %preview, "sending chat message");
        let started = Instant::now();

        let body = match tokio::time::timeout(timeout, self.post_and_buffer(&url, &payload)).await
        {
            Ok(Ok(body)) => body,
            Ok(Err(Transport::Http(source))) => {
                let elapsed = started.elapsed();
                warn!(error = %source, ?elapsed, "chat request failed");
                return Err(DifyError::Http { source, elapsed });
            }
            Ok(Err(Transport::Api { status, body })) => {
                let elapsed = started.elapsed();
                warn!(status, ?elapsed, "chat request rejected");
                return Err(DifyError::Api {
                    status,
                    body,
                    elapsed,
                });
            }
            Err(_) => {
                let elapsed = started.elapsed();
                warn!(?elapsed, "chat request timed out");
                return Err(DifyError::Timeout { elapsed });
            }
        };

        let elapsed = started.elapsed();
        let events = decode_stream(&body);
        let result = aggregate(&events);
        debug!(
            events = events.len(),
            files = result.files.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "chat response aggregated"
        );

        Ok(ChatOutcome {
            answer: result.answer.clone(),
            result,
            elapsed,
        })
    }

    /// POST the request and buffer the streamed body to completion.
    async fn post_and_buffer(
        &self,
        url: &str,
        payload: &Value,
    ) -> std::result::Result<String, Transport> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(Transport::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Transport::Api {
                status: status.as_u16(),
                body,
            });
        }
        response.text().await.map_err(Transport::Http)
    }

    /// Generate campaign text content for a (product, event) pair. Starts a
    /// new conversation.
    pub async fn generate_content(
        &self,
        product: &str,
        event: &str,
        timeout: Duration,
    ) -> Result<ChatOutcome> {
        self.send_chat(&content_query(product, event), None, timeout)
            .await
    }

    /// Generate a campaign image within an existing conversation.
    pub async fn generate_image(
        &self,
        image_prompt: &str,
        conversation_id: &str,
        timeout: Duration,
    ) -> Result<ChatOutcome> {
        self.send_chat(&image_query(image_prompt), Some(conversation_id), timeout)
            .await
    }

    /// Evaluate a campaign within an existing conversation.
    pub async fn evaluate(
        &self,
        campaign_data: &Value,
        conversation_id: &str,
        timeout: Duration,
    ) -> Result<ChatOutcome> {
        self.send_chat(
            &evaluation_query(campaign_data),
            Some(conversation_id),
            timeout,
        )
        .await
    }

    /// List prior messages of a conversation (read-only companion endpoint;
    /// inspection tooling only, unused by the pipeline).
    pub async fn list_messages(&self, conversation_id: &str, limit: u32) -> Result<Vec<Value>> {
        let url = format!("{}/messages", self.config.base_url);
        let started = Instant::now();

        let send = async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.config.api_key)
                .query(&[
                    ("conversation_id", conversation_id),
                    ("user", &self.config.user),
                    ("limit", &limit.to_string()),
                ])
                .send()
                .await
                .map_err(Transport::Http)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Transport::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            response.json::<Value>().await.map_err(Transport::Http)
        };

        match send.await {
            Ok(body) => Ok(body
                .get("data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()),
            Err(Transport::Http(source)) => Err(DifyError::Http {
                source,
                elapsed: started.elapsed(),
            }),
            Err(Transport::Api { status, body }) => Err(DifyError::Api {
                status,
                body,
                elapsed: started.elapsed(),
            }),
        }
    }
}

fn content_query(product: &str, event: &str) -> String {
    format!("Generate advertising campaign for product: {product}, event: {event}")
}

fn image_query(image_prompt: &str) -> String {
    format!("Generate a high-quality advertising image based on this description: {image_prompt}")
}

fn evaluation_query(campaign_data: &Value) -> String {
    format!("Evaluate this advertisement: {campaign_data}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> DifyConfig {
        DifyConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            user: "research_bot".to_string(),
        }
    }

    fn sse_body(lines: &[&str]) -> String {
        lines
            .iter()
            .map(|l| format!("data: {l}\n\n"))
            .collect::<String>()
    }

    #[test]
    fn content_query_embeds_product_and_event() {
        let q = content_query("Smartphone", "Black Friday");
        assert!(q.contains("product: Smartphone"));
        assert!(q.contains("event: Black Friday"));
    }

    #[test]
    fn evaluation_query_serializes_campaign_data() {
        let q = evaluation_query(&json!({"product": "Tablet"}));
        assert!(q.starts_with("Evaluate this advertisement: "));
        assert!(q.contains("\"product\":\"Tablet\""));
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = DifyClient::new(config("https://api.example/v1/"));
        assert_eq!(client.config.base_url, "https://api.example/v1");
    }

    #[tokio::test]
    async fn send_chat_aggregates_streamed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "user": "research_bot",
                "response_mode": "streaming",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                sse_body(&[
                    r#"{"event":"message","answer":"Hel","conversation_id":"c1","message_id":"m1"}"#,
                    r#"{"event":"message","answer":"lo"}"#,
                    r#"{"event":"message_end","id":"m1","conversation_id":"c1","metadata":{"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5,"total_price":"0.0001","currency":"USD"}}}"#,
                ]),
                "text/event-stream",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let outcome = client
            .send_chat("hello", None, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.answer.as_deref(), Some("Hello"));
        assert_eq!(outcome.result.conversation_id.as_deref(), Some("c1"));
        assert_eq!(outcome.result.usage.total_tokens, 5);
        assert!(outcome.elapsed > Duration::ZERO);
    }

    #[tokio::test]
    async fn send_chat_forwards_conversation_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .and(body_partial_json(json!({"conversation_id": "c42"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                sse_body(&[r#"{"event":"message","answer":"ok"}"#]),
                "text/event-stream",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let outcome = client
            .send_chat("continue", Some("c42"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome.answer.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error_with_elapsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let error = client
            .send_chat("hello", None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_matches!(&error, DifyError::Api { status: 500, body, .. } if body == "boom");
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_raw(
                        sse_body(&[r#"{"event":"message","answer":"late"}"#]),
                        "text/event-stream",
                    ),
            )
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let error = client
            .send_chat("hello", None, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_matches!(error, DifyError::Timeout { .. });
        assert!(error.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn empty_stream_yields_absent_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat-messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("event: ping\n\n", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let outcome = client
            .send_chat("hello", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome.answer, None);
    }

    #[tokio::test]
    async fn list_messages_returns_data_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "m1"}, {"id": "m2"}],
            })))
            .mount(&server)
            .await;

        let client = DifyClient::new(config(&server.uri()));
        let messages = client.list_messages("c1", 20).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["id"], "m1");
    }
}
