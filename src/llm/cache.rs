//! Exact-match response cache for generation calls.
//!
//! Keys are `(prompt, max_new_tokens)`. Only successful generations are
//! stored, so a transient endpoint failure is retried on the next identical
//! call. Entries live for the process lifetime unless a size cap is set, in
//! which case the oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::InferenceError;
use crate::llm::provider::InferenceProvider;

/// Cache key for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub prompt: String,
    pub max_new_tokens: u32,
}

impl CacheKey {
    pub fn new(prompt: &str, max_new_tokens: u32) -> Self {
        Self {
            prompt: prompt.to_string(),
            max_new_tokens,
        }
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// In-memory response cache.
pub struct ResponseCache {
    inner: RwLock<CacheInner>,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            max_entries: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cap the number of stored responses.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Look up a response, counting the hit or miss.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let found = self.inner.read().await.entries.get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a response.
    pub async fn insert(&self, key: CacheKey, response: String) {
        if self.max_entries == Some(0) {
            return;
        }

        let mut inner = self.inner.write().await;
        if inner.entries.insert(key.clone(), response).is_none() {
            inner.order.push_back(key);
        }

        if let Some(max) = self.max_entries {
            while inner.entries.len() > max {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
            }
        }
    }

    /// Drop every stored response. Counters are kept.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.order.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider wrapper that answers repeated calls from a [`ResponseCache`].
pub struct CachedProvider {
    inner: Arc<dyn InferenceProvider>,
    cache: Arc<ResponseCache>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn InferenceProvider>, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    /// The cache backing this provider.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}

#[async_trait]
impl InferenceProvider for CachedProvider {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, InferenceError> {
        let key = CacheKey::new(prompt, max_new_tokens);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(provider = self.inner.name(), "Response cache hit");
            return Ok(cached);
        }

        let response = self.inner.generate(prompt, max_new_tokens).await?;
        self.cache.insert(key, response.clone()).await;
        Ok(response)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
