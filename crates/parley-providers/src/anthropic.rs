use async_trait::async_trait;
use serde_json::json;

use parley_types::{ChatError, Message, Role};

use crate::adapter::{read_json, transport_error, ProviderAdapter, CHAT_TIMEOUT, PROBE_TIMEOUT};

// ---------------------------------------------------------------------------
// AnthropicAdapter
// ---------------------------------------------------------------------------

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The Messages API requires an explicit cap; matches the original client's
/// fixed request size.
const MAX_TOKENS: u32 = 4096;

#[derive(Debug)]
pub struct AnthropicAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Request translation
// ---------------------------------------------------------------------------

/// The Messages API takes system text as a top-level field, not a message
/// role, so the transcript is split before serialization.
fn build_request_body(model: &str, transcript: &[Message]) -> serde_json::Value {
    let system: Vec<&str> = transcript
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let messages: Vec<serde_json::Value> = transcript
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({ "role": m.role, "content": m.content }))
        .collect();

    let mut body = json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "messages": messages,
    });

    if !system.is_empty() {
        body["system"] = json!(system.join("\n\n"));
    }

    body
}

// ---------------------------------------------------------------------------
// Response translation
// ---------------------------------------------------------------------------

fn parse_models(body: &serde_json::Value) -> Result<Vec<String>, ChatError> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Anthropic".into(),
            message: "missing 'data' array in model list".into(),
        })?;

    Ok(data
        .iter()
        .filter_map(|m| m["id"].as_str().map(String::from))
        .collect())
}

fn parse_reply(body: &serde_json::Value) -> Result<String, ChatError> {
    let blocks = body["content"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Anthropic".into(),
            message: "missing 'content' array in reply".into(),
        })?;

    let text: String = blocks
        .iter()
        .filter_map(|b| b["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(ChatError::MalformedResponse {
            provider: "Anthropic".into(),
            message: "reply contained no text blocks".into(),
        });
    }

    Ok(text)
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        "Anthropic"
    }

    fn credential_key(&self) -> &str {
        "anthropic"
    }

    async fn fetch_models(&self, credential: &str) -> Result<Vec<String>, ChatError> {
        if credential.is_empty() {
            return Err(ChatError::Auth {
                provider: self.name().into(),
            });
        }

        let resp = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-api-key", credential)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_error(self.name(), PROBE_TIMEOUT, e))?;

        let body = read_json(self.name(), PROBE_TIMEOUT, resp).await?;
        parse_models(&body)
    }

    async fn complete(
        &self,
        model: &str,
        transcript: &[Message],
        credential: &str,
    ) -> Result<String, ChatError> {
        if credential.is_empty() {
            return Err(ChatError::Auth {
                provider: self.name().into(),
            });
        }

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", credential)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(CHAT_TIMEOUT)
            .json(&build_request_body(model, transcript))
            .send()
            .await
            .map_err(|e| transport_error(self.name(), CHAT_TIMEOUT, e))?;

        let body = read_json(self.name(), CHAT_TIMEOUT, resp).await?;
        parse_reply(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_identity() {
        let adapter = AnthropicAdapter::new();
        assert_eq!(adapter.name(), "Anthropic");
        assert_eq!(adapter.credential_key(), "anthropic");
    }

    #[test]
    fn build_request_body_splits_system_messages() {
        let transcript = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello"),
            Message::assistant("Hi!"),
            Message::user("How are you?"),
        ];
        let body = build_request_body("claude-sonnet-4-5", &transcript);

        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], "You are a helpful assistant.");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "How are you?");
    }

    #[test]
    fn build_request_body_omits_system_when_absent() {
        let body = build_request_body("claude-sonnet-4-5", &[Message::user("Hello")]);
        assert!(body.get("system").is_none() || body["system"].is_null());
    }

    #[test]
    fn parse_models_extracts_ids() {
        let body = json!({
            "data": [
                { "id": "claude-sonnet-4-5", "type": "model" },
                { "id": "claude-haiku-4-5", "type": "model" },
            ]
        });
        assert_eq!(
            parse_models(&body).unwrap(),
            vec!["claude-sonnet-4-5", "claude-haiku-4-5"]
        );
    }

    #[test]
    fn parse_reply_joins_text_blocks() {
        let body = json!({
            "content": [
                { "type": "text", "text": "Hello" },
                { "type": "text", "text": ", world" },
            ]
        });
        assert_eq!(parse_reply(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn parse_reply_rejects_textless_content() {
        let err = parse_reply(&json!({ "content": [] })).unwrap_err();
        assert!(matches!(err, ChatError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn empty_credential_short_circuits() {
        let adapter = AnthropicAdapter::new();
        assert!(!adapter.probe("").await);
        assert!(adapter.list_models("").await.is_empty());

        let reply = adapter
            .send("claude-sonnet-4-5", &[Message::user("hi")], "")
            .await;
        assert_eq!(reply, "Error: authentication failed for provider Anthropic");
    }
}
