use async_trait::async_trait;
use serde_json::json;

use parley_types::{ChatError, Message};

use crate::adapter::{read_json, transport_error, ProviderAdapter, CHAT_TIMEOUT, PROBE_TIMEOUT};

// ---------------------------------------------------------------------------
// OllamaAdapter
// ---------------------------------------------------------------------------

/// Local inference server. The "credential" is the port of a daemon on
/// localhost, not a secret; a refused connection means the daemon is not
/// running, which the probe reports as plain unavailability.
#[derive(Debug, Default)]
pub struct OllamaAdapter {
    client: reqwest::Client,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, port: &str) -> Result<String, ChatError> {
        port.parse::<u16>()
            .map(|p| format!("http://localhost:{p}"))
            .map_err(|_| ChatError::Other(format!("invalid Ollama port '{port}'")))
    }
}

// ---------------------------------------------------------------------------
// Response translation
// ---------------------------------------------------------------------------

fn parse_tags(body: &serde_json::Value) -> Result<Vec<String>, ChatError> {
    let models = body["models"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Ollama".into(),
            message: "missing 'models' array in tag list".into(),
        })?;

    Ok(models
        .iter()
        .filter_map(|m| m["model"].as_str().map(String::from))
        .collect())
}

fn parse_reply(body: &serde_json::Value) -> Result<String, ChatError> {
    body["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Ollama".into(),
            message: "missing 'message.content' in reply".into(),
        })
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn credential_key(&self) -> &str {
        "ollama"
    }

    async fn fetch_models(&self, credential: &str) -> Result<Vec<String>, ChatError> {
        let endpoint = self.endpoint(credential)?;

        let resp = self
            .client
            .get(format!("{endpoint}/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_error(self.name(), PROBE_TIMEOUT, e))?;

        let body = read_json(self.name(), PROBE_TIMEOUT, resp).await?;
        parse_tags(&body)
    }

    async fn complete(
        &self,
        model: &str,
        transcript: &[Message],
        credential: &str,
    ) -> Result<String, ChatError> {
        let endpoint = self.endpoint(credential)?;

        let body = json!({
            "model": model,
            "messages": transcript,
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{endpoint}/api/chat"))
            .timeout(CHAT_TIMEOUT)
            .json(&body)
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
        let adapter = OllamaAdapter::new();
        assert_eq!(adapter.name(), "Ollama");
        assert_eq!(adapter.credential_key(), "ollama");
    }

    #[test]
    fn endpoint_formats_port() {
        let adapter = OllamaAdapter::new();
        assert_eq!(
            adapter.endpoint("11434").unwrap(),
            "http://localhost:11434"
        );
    }

    #[test]
    fn endpoint_rejects_non_numeric_port() {
        let adapter = OllamaAdapter::new();
        assert!(adapter.endpoint("not-a-port").is_err());
        assert!(adapter.endpoint("").is_err());
        assert!(adapter.endpoint("99999").is_err());
    }

    #[test]
    fn parse_tags_extracts_model_field() {
        let body = json!({
            "models": [
                { "name": "llama3:latest", "model": "llama3:latest" },
                { "name": "qwen3:8b", "model": "qwen3:8b" },
            ]
        });
        assert_eq!(
            parse_tags(&body).unwrap(),
            vec!["llama3:latest", "qwen3:8b"]
        );
    }

    #[test]
    fn parse_reply_extracts_message_content() {
        let body = json!({
            "model": "llama3",
            "message": { "role": "assistant", "content": "Hello!" },
            "done": true
        });
        assert_eq!(parse_reply(&body).unwrap(), "Hello!");
    }

    #[test]
    fn parse_reply_rejects_missing_message() {
        let err = parse_reply(&json!({ "done": true })).unwrap_err();
        assert!(matches!(err, ChatError::MalformedResponse { .. }));
    }

    // Port 9 (discard) has no listener on a normal host; the connection is
    // refused immediately, which must read as "not available".
    #[tokio::test]
    async fn probe_false_when_connection_refused() {
        let adapter = OllamaAdapter::new();
        assert!(!adapter.probe("9").await);
        assert!(adapter.list_models("9").await.is_empty());
    }

    #[tokio::test]
    async fn send_reports_connection_failure_as_error_text() {
        let adapter = OllamaAdapter::new();
        let reply = adapter.send("llama3", &[Message::user("hi")], "9").await;
        assert!(reply.starts_with("Error: "), "got: {reply}");
    }
}
