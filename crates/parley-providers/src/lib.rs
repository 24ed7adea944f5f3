//! Provider layer for the parley chat core.
//!
//! Provides the `ProviderAdapter` trait, one adapter per vendor (OpenAI,
//! Anthropic, Gemini, Mistral, Deepseek, Ollama), the `Credentials` store,
//! and the `ProviderRegistry` for cached availability and model discovery.

mod adapter;
mod anthropic;
mod credentials;
mod deepseek;
mod gemini;
mod mistral;
mod ollama;
mod openai;
mod registry;

pub use adapter::{ProviderAdapter, CHAT_TIMEOUT, PROBE_TIMEOUT};
pub use anthropic::AnthropicAdapter;
pub use credentials::{Credentials, DEFAULT_OLLAMA_PORT, RECOGNIZED_KEYS};
pub use deepseek::DeepseekAdapter;
pub use gemini::GeminiAdapter;
pub use mistral::MistralAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use registry::{ProviderRegistry, AVAILABILITY_TTL};
