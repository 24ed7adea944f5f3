use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use parley_types::ChatError;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Provider keys the settings surface recognizes. `google` is accepted as an
/// alias for `gemini` on read.
pub const RECOGNIZED_KEYS: [&str; 6] = [
    "openai",
    "anthropic",
    "gemini",
    "mistral",
    "deepseek",
    "ollama",
];

/// The `ollama` entry holds a local port, not a secret.
pub const DEFAULT_OLLAMA_PORT: &str = "11434";

/// Flat provider-name → secret mapping, user-mutable at any time.
///
/// Persisted as a flat JSON object. A `BTreeMap` keeps the file and the
/// cache fingerprint deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// The credential for `key`, or `""` if unset. `gemini` falls back to a
    /// `google` entry; `ollama` falls back to the default port.
    pub fn get(&self, key: &str) -> &str {
        if let Some(value) = self.values.get(key) {
            if !value.is_empty() {
                return value;
            }
        }
        if key == "gemini" {
            if let Some(value) = self.values.get("google") {
                return value;
            }
        }
        if key == "ollama" {
            return DEFAULT_OLLAMA_PORT;
        }
        ""
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Identity of the credential set, used as part of cache keys so edits
    /// invalidate cached availability.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\u{1f}');
        }
        out
    }

    /// Read a credentials map from a flat JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let data = std::fs::read_to_string(path)?;
        let creds: Self = serde_json::from_str(&data)?;
        Ok(creds)
    }

    /// Like `load`, but a missing file yields an empty map.
    pub fn load_or_default(path: &Path) -> Result<Self, ChatError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Serialize this map to JSON and write it to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ChatError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
