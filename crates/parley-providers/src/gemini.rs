use async_trait::async_trait;
use serde_json::json;

use parley_types::{ChatError, Message, Role};

use crate::adapter::{read_json, transport_error, ProviderAdapter, CHAT_TIMEOUT, PROBE_TIMEOUT};

// ---------------------------------------------------------------------------
// GeminiAdapter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// The catalog returns fully-qualified names (`models/gemini-...`) and
    /// those names are what `list_models` surfaces, so both forms must
    /// resolve to a valid generateContent URL.
    fn generate_url(&self, model: &str) -> String {
        if model.starts_with("models/") {
            format!("{}/{}:generateContent", self.base_url, model)
        } else {
            format!("{}/models/{}:generateContent", self.base_url, model)
        }
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Request translation
// ---------------------------------------------------------------------------

/// Gemini receives the dialogue as one labelled text part rather than a
/// structured turn list.
fn flatten_transcript(transcript: &[Message]) -> String {
    let mut text = String::new();
    for msg in transcript {
        match msg.role {
            Role::User => {
                text.push_str("User: ");
                text.push_str(&msg.content);
                text.push_str("\n\n");
            }
            Role::Assistant => {
                text.push_str("Assistant: ");
                text.push_str(&msg.content);
                text.push_str("\n\n");
            }
            Role::System => {}
        }
    }
    text
}

fn build_request_body(transcript: &[Message]) -> serde_json::Value {
    let mut body = json!({
        "contents": [
            { "parts": [{ "text": flatten_transcript(transcript) }] }
        ],
    });

    let system_texts: Vec<&str> = transcript
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    if !system_texts.is_empty() {
        let parts: Vec<serde_json::Value> = system_texts
            .iter()
            .map(|t| json!({ "text": t }))
            .collect();
        body["systemInstruction"] = json!({ "parts": parts });
    }

    body
}

// ---------------------------------------------------------------------------
// Response translation
// ---------------------------------------------------------------------------

fn parse_models(body: &serde_json::Value) -> Result<Vec<String>, ChatError> {
    let models = body["models"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Gemini".into(),
            message: "missing 'models' array in model list".into(),
        })?;

    Ok(models
        .iter()
        .filter_map(|m| m["name"].as_str().map(String::from))
        .collect())
}

fn parse_reply(body: &serde_json::Value) -> Result<String, ChatError> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ChatError::MalformedResponse {
            provider: "Gemini".into(),
            message: "missing 'candidates[0].content.parts' in reply".into(),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(ChatError::MalformedResponse {
            provider: "Gemini".into(),
            message: "reply contained no text parts".into(),
        });
    }

    Ok(text)
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn credential_key(&self) -> &str {
        "gemini"
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
            .query(&[("key", credential)])
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
            .post(self.generate_url(model))
            .query(&[("key", credential)])
            .timeout(CHAT_TIMEOUT)
            .json(&build_request_body(transcript))
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
