use std::time::Duration;

use async_trait::async_trait;

use parley_types::{ChatError, Message};

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Timeout for availability probes and model-list calls.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for chat completion calls.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// ProviderAdapter
// ---------------------------------------------------------------------------

/// Uniform contract over one vendor's API.
///
/// Each vendor implements the structured half (`fetch_models` / `complete`);
/// the provided methods collapse failures into the observed contract:
/// `probe` returns a bool, `list_models` an empty list, and `send` an
/// `"Error: "`-prefixed string. Callers above the registry only ever see the
/// collapsed forms; adapter faults never propagate as raised errors.
///
/// Adapters hold no credential state: the credential is passed into every
/// call because the user may edit it at any time. Adapters are stateless and
/// reentrant; single-flight per conversation is the session layer's job.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Display name, e.g. `"OpenAI"`. Also the registry lookup key.
    fn name(&self) -> &str;

    /// Key under which this provider's credential is stored, e.g. `"openai"`.
    fn credential_key(&self) -> &str;

    /// Raw model catalog from the vendor. Errors are vendor faults
    /// (auth, transport, malformed payloads), already mapped to `ChatError`.
    async fn fetch_models(&self, credential: &str) -> Result<Vec<String>, ChatError>;

    /// One non-streaming completion over the full transcript.
    async fn complete(
        &self,
        model: &str,
        transcript: &[Message],
        credential: &str,
    ) -> Result<String, ChatError>;

    /// Lightweight reachability/credential check. True iff the model-list
    /// call succeeds with a non-empty catalog. Never raises.
    async fn probe(&self, credential: &str) -> bool {
        match self.fetch_models(credential).await {
            Ok(models) => !models.is_empty(),
            Err(err) => {
                tracing::debug!(provider = self.name(), error = %err, "probe failed");
                false
            }
        }
    }

    /// Model identifiers available to this credential; empty on any failure.
    async fn list_models(&self, credential: &str) -> Vec<String> {
        match self.fetch_models(credential).await {
            Ok(models) => models,
            Err(err) => {
                tracing::debug!(provider = self.name(), error = %err, "model list failed");
                Vec::new()
            }
        }
    }

    /// Completion collapsed to a value: the generated text, or a
    /// human-readable `"Error: "` string describing the failure.
    async fn send(&self, model: &str, transcript: &[Message], credential: &str) -> String {
        match self.complete(model, transcript, credential).await {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(provider = self.name(), model, error = %err, "completion failed");
                format!("Error: {err}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared error mapping
// ---------------------------------------------------------------------------

/// Maps a reqwest transport failure to the error taxonomy.
pub(crate) fn transport_error(
    provider: &str,
    timeout: Duration,
    err: reqwest::Error,
) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout {
            provider: provider.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        ChatError::Connection {
            provider: provider.into(),
            message: err.to_string(),
        }
    } else {
        ChatError::Provider {
            provider: provider.into(),
            status: 0,
            message: err.to_string(),
        }
    }
}

/// Maps a non-success HTTP status to the error taxonomy.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> ChatError {
    match status.as_u16() {
        401 | 403 => ChatError::Auth {
            provider: provider.into(),
        },
        429 => ChatError::RateLimited {
            provider: provider.into(),
        },
        code => ChatError::Provider {
            provider: provider.into(),
            status: code,
            message: extract_error_message(body),
        },
    }
}

/// Pulls the vendor's error message out of a failure payload, falling back
/// to the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
                .or_else(|| v["error"].as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Checks the status and decodes the JSON body of a vendor response.
pub(crate) async fn read_json(
    provider: &str,
    timeout: Duration,
    resp: reqwest::Response,
) -> Result<serde_json::Value, ChatError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| transport_error(provider, timeout, e))?;

    if !status.is_success() {
        return Err(status_error(provider, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| ChatError::MalformedResponse {
        provider: provider.into(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
