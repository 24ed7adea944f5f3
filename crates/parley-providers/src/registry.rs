use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::{
    AnthropicAdapter, Credentials, DeepseekAdapter, GeminiAdapter, MistralAdapter, OllamaAdapter,
    OpenAiAdapter, ProviderAdapter,
};

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// How long availability and model-list results stay fresh.
pub const AVAILABILITY_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    values: Vec<String>,
    stamp: Instant,
}

/// Owns the adapter set and answers "who is reachable" / "what can they
/// run", with a short-lived cache in front of the network.
///
/// Adapters are selected here once, by name, at registration; callers never
/// branch on vendor strings themselves.
pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    ttl: Duration,
    provider_cache: Mutex<HashMap<String, CacheEntry>>,
    model_cache: Mutex<HashMap<String, CacheEntry>>,
}

impl ProviderRegistry {
    /// Registry with every supported vendor registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(OllamaAdapter::new());
        registry.register(DeepseekAdapter::new());
        registry.register(MistralAdapter::new());
        registry.register(OpenAiAdapter::new());
        registry.register(AnthropicAdapter::new());
        registry.register(GeminiAdapter::new());
        registry
    }

    /// Registry with no adapters, for callers that register their own.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
            ttl: AVAILABILITY_TTL,
            provider_cache: Mutex::new(HashMap::new()),
            model_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the cache TTL. A zero TTL disables caching.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn register(&mut self, adapter: impl ProviderAdapter + 'static) {
        self.adapters.push(Arc::new(adapter));
    }

    /// The adapter registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(Arc::clone)
    }

    /// Names of all registered adapters, reachable or not.
    pub fn provider_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    /// Probes every adapter concurrently and returns the names that
    /// answered, in completion order. A probe that fails or panics counts
    /// as unavailable.
    pub async fn available_providers(&self, credentials: &Credentials) -> Vec<String> {
        let cache_key = credentials.fingerprint();
        if let Some(hit) = self.cache_get(&self.provider_cache, &cache_key).await {
            tracing::debug!("available_providers served from cache");
            return hit;
        }

        let mut probes = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let credential = credentials.get(adapter.credential_key()).to_string();
            probes.spawn(async move {
                let ok = adapter.probe(&credential).await;
                (adapter.name().to_string(), ok)
            });
        }

        let mut available = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((name, true)) => available.push(name),
                Ok((name, false)) => {
                    tracing::debug!(provider = %name, "provider unavailable");
                }
                Err(err) => {
                    tracing::debug!(error = %err, "probe task failed");
                }
            }
        }

        tracing::debug!(count = available.len(), "provider probe sweep finished");
        self.cache_put(&self.provider_cache, cache_key, available.clone())
            .await;
        available
    }

    /// Model identifiers for one provider; empty for an unrecognized name
    /// or any upstream failure.
    pub async fn available_models(
        &self,
        provider: &str,
        credentials: &Credentials,
    ) -> Vec<String> {
        let Some(adapter) = self.get(provider) else {
            return Vec::new();
        };

        let credential = credentials.get(adapter.credential_key()).to_string();
        let cache_key = format!("{provider}\u{1f}{credential}");
        if let Some(hit) = self.cache_get(&self.model_cache, &cache_key).await {
            tracing::debug!(provider, "available_models served from cache");
            return hit;
        }

        let models = adapter.list_models(&credential).await;
        self.cache_put(&self.model_cache, cache_key, models.clone())
            .await;
        models
    }

    async fn cache_get(
        &self,
        cache: &Mutex<HashMap<String, CacheEntry>>,
        key: &str,
    ) -> Option<Vec<String>> {
        let map = cache.lock().await;
        map.get(key)
            .filter(|entry| entry.stamp.elapsed() < self.ttl)
            .map(|entry| entry.values.clone())
    }

    async fn cache_put(
        &self,
        cache: &Mutex<HashMap<String, CacheEntry>>,
        key: String,
        values: Vec<String>,
    ) {
        let mut map = cache.lock().await;
        map.insert(
            key,
            CacheEntry {
                values,
                stamp: Instant::now(),
            },
        );
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
