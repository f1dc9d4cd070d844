use std::sync::Arc;

use anyhow::Context;

use crate::core::config::{AppPaths, Settings};
use crate::llm::{Capability, EmbeddingProvider, GenerationProvider, OpenAiProvider};
use crate::rag::{RagChatbot, VectorIndex};
use crate::storage::{ChunkStore, JsonStorage};

/// Global application state shared across all routes.
///
/// The state owns the lifecycle of every retrieval dependency: storage,
/// the vector index snapshot, and the optional providers. The chatbot
/// receives them by injection and holds no globals of its own.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub storage: Arc<JsonStorage>,
    pub chatbot: Arc<RagChatbot>,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths);
        Self::with_parts(paths, settings).await
    }

    /// Build state from explicit paths and settings (used by tests and
    /// the offline tooling).
    pub async fn with_parts(paths: Arc<AppPaths>, settings: Settings) -> anyhow::Result<Arc<Self>> {
        let storage = Arc::new(JsonStorage::new(paths.storage_dir.clone()));
        storage
            .initialize()
            .await
            .context("Failed to initialize storage")?;

        let index = Arc::new(VectorIndex::restore(
            &paths.embeddings_dir,
            &settings.vector_index_name,
            settings.embedding_dimensions,
        ));

        let (embedder, generator) = provider_capabilities(build_provider(&settings));
        tracing::info!(
            "Capabilities: vector index {} entries, embeddings {}, generation {}",
            index.len(),
            if embedder.is_ready() { "ready" } else { "unavailable" },
            if generator.is_ready() { "ready" } else { "unavailable" },
        );

        let chatbot = Arc::new(RagChatbot::new(
            Arc::clone(&storage) as Arc<dyn ChunkStore>,
            index,
            embedder,
            generator,
            settings.rag_top_k,
        ));

        Ok(Arc::new(AppState {
            paths,
            settings,
            storage,
            chatbot,
        }))
    }
}

/// Construct the configured provider, if credentials exist. Absence is a
/// normal configuration state, not an error.
pub fn build_provider(settings: &Settings) -> Option<OpenAiProvider> {
    if settings.use_azure_openai {
        match (
            &settings.azure_openai_api_key,
            &settings.azure_openai_endpoint,
        ) {
            (Some(api_key), Some(endpoint)) => Some(OpenAiProvider::azure(
                api_key.clone(),
                endpoint.clone(),
                settings.azure_openai_deployment_name.clone(),
                settings.azure_openai_embedding_deployment_name.clone(),
                settings.azure_openai_api_version.clone(),
                settings.embedding_dimensions,
                settings.provider_timeout_secs,
            )),
            _ => None,
        }
    } else {
        settings.openai_api_key.as_ref().map(|api_key| {
            OpenAiProvider::openai(
                api_key.clone(),
                settings.openai_base_url.clone(),
                settings.openai_model.clone(),
                settings.openai_embedding_model.clone(),
                settings.embedding_dimensions,
                settings.provider_timeout_secs,
            )
        })
    }
}

/// Split one provider instance into its embedding and generation
/// capabilities; either side may be unavailable on its own (e.g. an Azure
/// setup with only a chat deployment).
pub fn provider_capabilities(
    provider: Option<OpenAiProvider>,
) -> (
    Capability<dyn EmbeddingProvider>,
    Capability<dyn GenerationProvider>,
) {
    match provider {
        Some(provider) => {
            let shared = Arc::new(provider);
            let embedder = if shared.supports_embeddings() {
                Capability::Ready(Arc::clone(&shared) as Arc<dyn EmbeddingProvider>)
            } else {
                Capability::Unavailable
            };
            let generator = if shared.supports_generation() {
                Capability::Ready(shared as Arc<dyn GenerationProvider>)
            } else {
                Capability::Unavailable
            };
            (embedder, generator)
        }
        None => (Capability::Unavailable, Capability::Unavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_means_no_capabilities() {
        let settings = Settings::default();
        assert!(build_provider(&settings).is_none());

        let (embedder, generator) = provider_capabilities(None);
        assert!(!embedder.is_ready());
        assert!(!generator.is_ready());
    }

    #[test]
    fn openai_key_enables_both_capabilities() {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        };

        let (embedder, generator) = provider_capabilities(build_provider(&settings));
        assert!(embedder.is_ready());
        assert!(generator.is_ready());
    }

    #[test]
    fn azure_chat_only_setup_lacks_embeddings() {
        let settings = Settings {
            use_azure_openai: true,
            azure_openai_api_key: Some("key".to_string()),
            azure_openai_endpoint: Some("https://example.openai.azure.com".to_string()),
            azure_openai_deployment_name: Some("gpt4-chat".to_string()),
            azure_openai_embedding_deployment_name: None,
            ..Settings::default()
        };

        let (embedder, generator) = provider_capabilities(build_provider(&settings));
        assert!(!embedder.is_ready());
        assert!(generator.is_ready());
    }

    #[tokio::test]
    async fn state_initializes_against_an_empty_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Arc::new(AppPaths::with_data_dir(dir.path().to_path_buf()));
        let settings = Settings::default();

        let state = AppState::with_parts(paths, settings)
            .await
            .expect("initialize");

        let answer = state
            .chatbot
            .answer("demo-101", "What are pointers?", &[])
            .await
            .expect("answer");
        assert!(!answer.message.is_empty());
        assert!(answer.sources.is_empty());
    }
}
