use async_trait::async_trait;
use serde_json::json;

use parley_types::{ChatError, Message};

use crate::adapter::{read_json, transport_error, ProviderAdapter, CHAT_TIMEOUT, PROBE_TIMEOUT};

// ---------------------------------------------------------------------------
// OpenAiAdapter
// ---------------------------------------------------------------------------

/// Substrings identifying chat-capable entries in OpenAI's model catalog.
/// The raw catalog mixes in embedding, audio, and image models that a chat
/// session can never use.
const MODEL_ALLOW_LIST: &[&str] = &["gpt", "o1", "o3", "o4"];

#[derive(Debug)]
pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn credential_key(&self) -> &str {
        "openai"
    }

    async fn fetch_models(&self, credential: &str) -> Result<Vec<String>, ChatError> {
        compatible_fetch_models(&self.client, self.name(), &self.base_url, credential).await
    }

    /// Unlike the other vendors, OpenAI's catalog is filtered down to
    /// chat-capable identifiers.
    async fn list_models(&self, credential: &str) -> Vec<String> {
        match self.fetch_models(credential).await {
            Ok(models) => models
                .into_iter()
                .filter(|id| is_chat_model(id))
                .collect(),
            Err(err) => {
                tracing::debug!(provider = self.name(), error = %err, "model list failed");
                Vec::new()
            }
        }
    }

    async fn complete(
        &self,
        model: &str,
        transcript: &[Message],
        credential: &str,
    ) -> Result<String, ChatError> {
        compatible_complete(
            &self.client,
            self.name(),
            &self.base_url,
            model,
            transcript,
            credential,
        )
        .await
    }
}

fn is_chat_model(id: &str) -> bool {
    MODEL_ALLOW_LIST.iter().any(|needle| id.contains(needle))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire helpers
//
// Deepseek and Mistral expose the same `/models` and `/chat/completions`
// shapes, so their adapters delegate here with a swapped base URL.
// ---------------------------------------------------------------------------

pub(crate) fn chat_request_body(model: &str, transcript: &[Message]) -> serde_json::Value {
    json!({
        "model": model,
        "messages": transcript,
        "stream": false,
    })
}

/// Parses `{"data": [{"id": ...}, ...]}` into model identifiers.
pub(crate) fn parse_model_ids(
    provider: &str,
    body: &serde_json::Value,
) -> Result<Vec<String>, ChatError> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: provider.into(),
            message: "missing 'data' array in model list".into(),
        })?;

    Ok(data
        .iter()
        .filter_map(|m| m["id"].as_str().map(String::from))
        .collect())
}

/// Parses `choices[0].message.content` out of a chat completion.
pub(crate) fn parse_chat_text(
    provider: &str,
    body: &serde_json::Value,
) -> Result<String, ChatError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: provider.into(),
            message: "missing 'choices[0].message.content' in completion".into(),
        })
}

pub(crate) async fn compatible_fetch_models(
    client: &reqwest::Client,
    provider: &str,
    base_url: &str,
    credential: &str,
) -> Result<Vec<String>, ChatError> {
    if credential.is_empty() {
        return Err(ChatError::Auth {
            provider: provider.into(),
        });
    }

    let resp = client
        .get(format!("{base_url}/models"))
        .bearer_auth(credential)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map_err(|e| transport_error(provider, PROBE_TIMEOUT, e))?;

    let body = read_json(provider, PROBE_TIMEOUT, resp).await?;
    parse_model_ids(provider, &body)
}

pub(crate) async fn compatible_complete(
    client: &reqwest::Client,
    provider: &str,
    base_url: &str,
    model: &str,
    transcript: &[Message],
    credential: &str,
) -> Result<String, ChatError> {
    if credential.is_empty() {
        return Err(ChatError::Auth {
            provider: provider.into(),
        });
    }

    let resp = client
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(credential)
        .timeout(CHAT_TIMEOUT)
        .json(&chat_request_body(model, transcript))
        .send()
        .await
        .map_err(|e| transport_error(provider, CHAT_TIMEOUT, e))?;

    let body = read_json(provider, CHAT_TIMEOUT, resp).await?;
    parse_chat_text(provider, &body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
