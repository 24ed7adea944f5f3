use async_trait::async_trait;

use parley_types::{ChatError, Message};

use crate::adapter::ProviderAdapter;
use crate::openai::{compatible_complete, compatible_fetch_models};

// ---------------------------------------------------------------------------
// DeepseekAdapter
// ---------------------------------------------------------------------------

/// Deepseek exposes the OpenAI-compatible surface at its own host, so this
/// adapter is the OpenAI wire code pointed at a different base URL.
#[derive(Debug)]
pub struct DeepseekAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl DeepseekAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.deepseek.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for DeepseekAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for DeepseekAdapter {
    fn name(&self) -> &str {
        "Deepseek"
    }

    fn credential_key(&self) -> &str {
        "deepseek"
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
