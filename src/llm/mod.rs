//! Text-generation providers.
//!
//! - [`InferenceProvider`]: the async seam every analysis call goes through
//! - [`HuggingFaceProvider`]: hosted inference endpoint over HTTPS
//! - [`CachedProvider`] / [`ResponseCache`]: exact-match memoization

mod cache;
mod huggingface;
mod provider;

use std::sync::Arc;

pub use cache::{CacheKey, CacheStats, CachedProvider, ResponseCache};
pub use huggingface::{HuggingFaceProvider, strip_prompt_echo};
pub use provider::InferenceProvider;

use crate::config::InferenceConfig;
use crate::error::InferenceError;

/// Build the hosted provider wrapped in its response cache.
pub fn build_provider(config: &InferenceConfig) -> Result<Arc<CachedProvider>, InferenceError> {
    let remote = HuggingFaceProvider::new(config.clone())?;
    let cache = match config.cache_max_entries {
        Some(max) => ResponseCache::new().with_max_entries(max),
        None => ResponseCache::new(),
    };
    tracing::info!(
        endpoint = %config.endpoint,
        timeout_secs = config.timeout.as_secs(),
        cache_max_entries = ?config.cache_max_entries,
        "Inference provider ready"
    );
    Ok(Arc::new(CachedProvider::new(
        Arc::new(remote),
        Arc::new(cache),
    )))
}
