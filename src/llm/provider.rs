use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::ChatMessage;

/// Failure at a provider boundary. These are caught by the orchestrator
/// and treated as fallback triggers, never surfaced to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider request failed: {0}")]
    Http(String),
    #[error("provider returned a malformed response: {0}")]
    Malformed(String),
    #[error("provider is not configured for {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "openai", "azure-openai")
    fn name(&self) -> &str;

    /// turn text into a fixed-length vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// synthesize an answer from a system instruction plus conversation
    /// turns (history and the grounded user query)
    async fn generate(
        &self,
        system_context: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}

/// Runtime presence of an optional provider. The orchestrator switches on
/// this once per request instead of null-checking handles at every call
/// site.
pub enum Capability<P: ?Sized> {
    Ready(Arc<P>),
    Unavailable,
}

impl<P: ?Sized> Capability<P> {
    pub fn from_option(provider: Option<Arc<P>>) -> Self {
        match provider {
            Some(provider) => Capability::Ready(provider),
            None => Capability::Unavailable,
        }
    }

    pub fn get(&self) -> Option<&Arc<P>> {
        match self {
            Capability::Ready(provider) => Some(provider),
            Capability::Unavailable => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }
}

impl<P: ?Sized> Clone for Capability<P> {
    fn clone(&self) -> Self {
        match self {
            Capability::Ready(provider) => Capability::Ready(Arc::clone(provider)),
            Capability::Unavailable => Capability::Unavailable,
        }
    }
}
