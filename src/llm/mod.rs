//! Optional external providers: embeddings and answer generation.
//!
//! Providers are modeled as explicit capabilities; absence of credentials
//! is a configuration state, not an error.

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{Capability, EmbeddingProvider, GenerationProvider, ProviderError};
pub use types::ChatMessage;
