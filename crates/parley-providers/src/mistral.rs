use async_trait::async_trait;

use parley_types::{ChatError, Message};

use crate::adapter::ProviderAdapter;
use crate::openai::{compatible_complete, compatible_fetch_models};

// ---------------------------------------------------------------------------
// MistralAdapter
// ---------------------------------------------------------------------------

/// Mistral's REST surface is OpenAI-compatible (`/models`,
/// `/chat/completions`), so this adapter delegates to the shared wire code.
#[derive(Debug)]
pub struct MistralAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl MistralAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.mistral.ai/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for MistralAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for MistralAdapter {
    fn name(&self) -> &str {
        "Mistral"
    }

    fn credential_key(&self) -> &str {
        "mistral"
    }

    async fn fetch_models(&self, credential: &str) -> Result<Vec<String>, ChatError> {
        compatible_fetch_models(&self.client, self.name(), &self.base_url, credential).await
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_identity() {
        let adapter = MistralAdapter::new();
        assert_eq!(adapter.name(), "Mistral");
        assert_eq!(adapter.credential_key(), "mistral");
        assert_eq!(adapter.base_url, "https://api.mistral.ai/v1");
    }

    #[tokio::test]
    async fn empty_credential_short_circuits() {
        let adapter = MistralAdapter::new();
        assert!(!adapter.probe("").await);
        assert!(adapter.list_models("").await.is_empty());

        let reply = adapter
            .send("mistral-small-latest", &[Message::user("hi")], "")
            .await;
        assert_eq!(reply, "Error: authentication failed for provider Mistral");
    }
}
