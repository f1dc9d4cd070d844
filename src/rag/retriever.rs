//! Retrieval orchestrator: strategy selection and degradation policy.
//!
//! Vector search is a pure enhancement attempted first; keyword ranking
//! over the chunk store is the always-available baseline. Any failure on
//! the vector path is logged and silently downgraded, never surfaced.

use std::sync::Arc;

use thiserror::Error;

use crate::core::errors::ApiError;
use crate::llm::{Capability, EmbeddingProvider, ProviderError};
use crate::storage::ChunkStore;
use super::index::VectorIndex;
use super::keyword::rank_by_keywords;
use super::types::{RankedChunk, RetrievalResult, RetrievalStrategy};

#[derive(Debug, Error)]
enum VectorSearchFailure {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] ProviderError),
    #[error("index search failed: {0}")]
    Index(#[from] ApiError),
}

pub struct Retriever {
    chunk_store: Arc<dyn ChunkStore>,
    index: Arc<VectorIndex>,
    embedder: Capability<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(
        chunk_store: Arc<dyn ChunkStore>,
        index: Arc<VectorIndex>,
        embedder: Capability<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            chunk_store,
            index,
            embedder,
        }
    }

    /// Produce a ranked candidate list for the query, scoped to one course.
    ///
    /// A course with no chunks yields an empty result; that is not an
    /// error condition.
    pub async fn retrieve(
        &self,
        course_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult, ApiError> {
        if let Capability::Ready(embedder) = &self.embedder {
            if !self.index.is_empty() {
                match self.vector_search(embedder, course_id, query, top_k).await {
                    Ok(result) => return Ok(result),
                    Err(failure) => {
                        tracing::warn!(
                            "Vector search unavailable for course {} ({}); falling back to keyword ranking",
                            course_id,
                            failure
                        );
                    }
                }
            }
        }

        self.keyword_search(course_id, query, top_k).await
    }

    async fn vector_search(
        &self,
        embedder: &Arc<dyn EmbeddingProvider>,
        course_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult, VectorSearchFailure> {
        let query_embedding = embedder.embed(query).await?;
        let hits = self.index.search(&query_embedding, top_k, Some(course_id))?;

        let chunks = hits
            .into_iter()
            .map(|hit| RankedChunk {
                score: 1.0 / (1.0 + hit.distance),
                distance: Some(hit.distance),
                chunk: hit.chunk,
            })
            .collect();

        Ok(RetrievalResult {
            chunks,
            strategy: RetrievalStrategy::Vector,
        })
    }

    async fn keyword_search(
        &self,
        course_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult, ApiError> {
        let chunks = self.chunk_store.get_chunks(course_id).await?;
        Ok(RetrievalResult {
            chunks: rank_by_keywords(&chunks, query, top_k),
            strategy: RetrievalStrategy::Keyword,
        })
    }
}
