//! The text-generation seam.

use async_trait::async_trait;

use crate::error::InferenceError;

/// A remote text-generation backend.
///
/// One call is one prompt in, one completion out. Implementations do not
/// retry; callers decide what to do with a failure.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Generate a completion for `prompt`, producing at most `max_new_tokens` tokens.
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, InferenceError>;

    /// Short provider name used in logs.
    fn name(&self) -> &str;
}
