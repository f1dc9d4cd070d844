//! Offline embedding generation and index build.
//!
//! Embeds every stored knowledge chunk (with the configured provider, or
//! deterministic mock vectors when no credentials exist), writes the
//! embeddings back to storage, and persists a fresh vector index. Runs
//! out-of-band; the server picks the new index up on its next start.

use rand::Rng;

use coursecompanion_backend::core::config::{AppPaths, Settings};
use coursecompanion_backend::llm::Capability;
use coursecompanion_backend::logging;
use coursecompanion_backend::rag::{Chunk, VectorIndex};
use coursecompanion_backend::state::{build_provider, provider_capabilities};
use coursecompanion_backend::storage::{ChunkStore, JsonStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    let settings = Settings::load(&paths);
    logging::init(&paths);

    let storage = JsonStorage::new(paths.storage_dir.clone());
    storage.initialize().await?;

    let chunks = storage.all_chunks().await?;
    if chunks.is_empty() {
        tracing::warn!("No knowledge chunks in storage; nothing to embed");
        return Ok(());
    }

    let (embedder, _) = provider_capabilities(build_provider(&settings));
    match &embedder {
        Capability::Ready(provider) => {
            tracing::info!("Embedding {} chunks via {}", chunks.len(), provider.name())
        }
        Capability::Unavailable => tracing::warn!(
            "No embedding provider configured; generating mock vectors for {} chunks",
            chunks.len()
        ),
    }

    let dimensions = settings.embedding_dimensions;
    let mut vectors = Vec::with_capacity(chunks.len());
    let mut documents = Vec::with_capacity(chunks.len());
    let mut updated = Vec::with_capacity(chunks.len());
    let mut mocked = 0usize;

    for mut chunk in chunks {
        let vector = match embedder.get() {
            Some(provider) => match provider.embed(&chunk.content).await {
                Ok(vector) if vector.len() == dimensions => vector,
                Ok(vector) => {
                    tracing::warn!(
                        "Embedding for chunk {} has dimension {} (expected {}); using mock vector",
                        chunk.chunk_id,
                        vector.len(),
                        dimensions
                    );
                    mocked += 1;
                    mock_embedding(dimensions)
                }
                Err(err) => {
                    tracing::warn!(
                        "Embedding failed for chunk {} ({}); using mock vector",
                        chunk.chunk_id,
                        err
                    );
                    mocked += 1;
                    mock_embedding(dimensions)
                }
            },
            None => {
                mocked += 1;
                mock_embedding(dimensions)
            }
        };

        vectors.push(vector.clone());
        documents.push(Chunk {
            embedding: None,
            ..chunk.clone()
        });

        chunk.embedding = Some(vector);
        updated.push(chunk);
    }

    let mut index = VectorIndex::new(dimensions);
    index.add(vectors, documents)?;
    index.persist(&paths.embeddings_dir, &settings.vector_index_name)?;

    storage.save_chunks(updated).await?;

    tracing::info!(
        "Indexed {} chunks ({} mock vectors) under '{}'",
        index.len(),
        mocked,
        settings.vector_index_name
    );
    Ok(())
}

fn mock_embedding(dimensions: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..dimensions).map(|_| rng.random_range(-1.0..1.0)).collect()
}
