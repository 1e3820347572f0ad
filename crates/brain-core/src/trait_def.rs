//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::Prompt;

/// A language-model backend that turns a prompt into raw text.
///
/// The returned text is not guaranteed to be well-formed: callers that
/// expect structured output must extract and validate it themselves.
/// This trait is object-safe and can be used as `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &Prompt) -> Result<String, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

#[async_trait]
impl<B: Brain + ?Sized> Brain for std::sync::Arc<B> {
    async fn generate(&self, prompt: &Prompt) -> Result<String, BrainError> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_ready(&self) -> bool {
        (**self).is_ready().await
    }
}
