//! End-to-end chat service: retrieve, compose, cite.
//!
//! One instance serves all courses; every dependency is injected at
//! construction and shared immutably across requests.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{Capability, ChatMessage, EmbeddingProvider, GenerationProvider};
use crate::storage::ChunkStore;
use super::composer::{format_module, ResponseComposer};
use super::index::VectorIndex;
use super::retriever::Retriever;
use super::types::{Answer, RetrievalResult, RetrievalStrategy, SourceRef};

pub struct RagChatbot {
    chunk_store: Arc<dyn ChunkStore>,
    retriever: Retriever,
    composer: ResponseComposer,
    top_k: usize,
}

impl RagChatbot {
    pub fn new(
        chunk_store: Arc<dyn ChunkStore>,
        index: Arc<VectorIndex>,
        embedder: Capability<dyn EmbeddingProvider>,
        generator: Capability<dyn GenerationProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: Retriever::new(Arc::clone(&chunk_store), index, embedder),
            composer: ResponseComposer::new(generator),
            chunk_store,
            top_k,
        }
    }

    /// Answer a question against one course's knowledge base.
    ///
    /// Degraded infrastructure never fails this call; the only error is a
    /// blank course id (a caller mistake) or a broken chunk store.
    pub async fn answer(
        &self,
        course_id: &str,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<Answer, ApiError> {
        if course_id.trim().is_empty() {
            return Err(ApiError::BadRequest("course_id is required".to_string()));
        }

        tracing::debug!("Retrieving chunks for course {}", course_id);
        let result = self.retriever.retrieve(course_id, message, self.top_k).await?;

        let topic_summary = if result.is_empty() {
            self.chunk_store.topic_summary(course_id).await
        } else {
            String::new()
        };

        tracing::debug!(
            "Composing answer from {} chunk(s) for course {}",
            result.chunks.len(),
            course_id
        );
        let text = self
            .composer
            .compose(message, history, &result, &topic_summary)
            .await;

        Ok(Answer {
            message: text,
            sources: build_sources(&result),
            course_id: course_id.to_string(),
        })
    }
}

/// Build source citations, applying the per-strategy score scale: vector
/// scores are clamped into [0, 1]; keyword scores are raw / 10 and may
/// exceed 1. The two scales are intentionally not reconciled.
fn build_sources(result: &RetrievalResult) -> Vec<SourceRef> {
    result
        .chunks
        .iter()
        .map(|ranked| SourceRef {
            module: format_module(ranked.chunk.module.as_ref()),
            timestamp: ranked.chunk.timestamp.clone(),
            content_type: ranked.chunk.content_type.clone(),
            relevance_score: match result.strategy {
                RetrievalStrategy::Vector => ranked.score.clamp(0.0, 1.0),
                RetrievalStrategy::Keyword => ranked.score / 10.0,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::llm::ProviderError;
    use crate::rag::types::{Chunk, RankedChunk};

    struct MemoryStore {
        chunks: Vec<Chunk>,
        summary: String,
    }

    #[async_trait]
    impl ChunkStore for MemoryStore {
        async fn get_chunks(&self, course_id: &str) -> Result<Vec<Chunk>, ApiError> {
            Ok(self
                .chunks
                .iter()
                .filter(|chunk| chunk.course_id == course_id)
                .cloned()
                .collect())
        }

        async fn topic_summary(&self, _course_id: &str) -> String {
            self.summary.clone()
        }

        async fn all_chunks(&self) -> Result<Vec<Chunk>, ApiError> {
            Ok(self.chunks.clone())
        }

        async fn save_chunks(&self, _chunks: Vec<Chunk>) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct StaticEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for StaticEmbedder {
        fn name(&self) -> &str {
            "static"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(self.vector.clone())
        }
    }

    fn pointer_chunk() -> Chunk {
        Chunk {
            chunk_id: "c1".to_string(),
            course_id: "demo-101".to_string(),
            content: "Pointers store memory addresses.".to_string(),
            topic: "pointers".to_string(),
            module: None,
            timestamp: None,
            content_type: "text".to_string(),
            embedding: None,
        }
    }

    fn chatbot_without_providers(chunks: Vec<Chunk>, summary: &str) -> RagChatbot {
        RagChatbot::new(
            Arc::new(MemoryStore {
                chunks,
                summary: summary.to_string(),
            }),
            Arc::new(VectorIndex::new(2)),
            Capability::Unavailable,
            Capability::Unavailable,
            5,
        )
    }

    #[tokio::test]
    async fn keyword_fallback_answers_with_citation() {
        // One matching chunk, no optional infrastructure at all.
        let chatbot = chatbot_without_providers(vec![pointer_chunk()], "C programming topics");

        let answer = chatbot
            .answer("demo-101", "What are pointers?", &[])
            .await
            .expect("answer");

        assert!(answer.message.contains("Pointers store memory addresses."));
        assert_eq!(answer.course_id, "demo-101");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].module, "Module");
        assert!(answer.sources[0].relevance_score > 0.0);
    }

    #[tokio::test]
    async fn empty_course_answers_with_topic_fallback() {
        let chatbot = chatbot_without_providers(Vec::new(), "Sitecore Search topics");

        let answer = chatbot
            .answer("demo-101", "anything at all", &[])
            .await
            .expect("answer");

        assert!(answer.sources.is_empty());
        assert!(!answer.message.is_empty());
        assert!(answer.message.contains("Sitecore Search topics"));
    }

    #[tokio::test]
    async fn vector_path_ranks_by_embedding_similarity() {
        let mut index = VectorIndex::new(2);
        index
            .add(
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![
                    Chunk {
                        chunk_id: "chunk-1".to_string(),
                        content: "Variables hold values.".to_string(),
                        topic: "variables".to_string(),
                        ..pointer_chunk()
                    },
                    Chunk {
                        chunk_id: "chunk-2".to_string(),
                        module: Some(json!(2)),
                        ..pointer_chunk()
                    },
                ],
            )
            .expect("add");

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(StaticEmbedder {
            vector: vec![0.1, 0.9],
        });
        let chatbot = RagChatbot::new(
            Arc::new(MemoryStore {
                chunks: Vec::new(),
                summary: String::new(),
            }),
            Arc::new(index),
            Capability::Ready(embedder),
            Capability::Unavailable,
            5,
        );

        let answer = chatbot
            .answer("demo-101", "What are pointers?", &[])
            .await
            .expect("answer");

        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].module, "Module 2");
        assert!(answer.sources[0].relevance_score > answer.sources[1].relevance_score);
        assert!(answer.sources.iter().all(|s| s.relevance_score <= 1.0));
        assert!(answer.message.contains("Pointers store memory addresses."));
    }

    #[tokio::test]
    async fn blank_course_id_is_a_caller_error() {
        let chatbot = chatbot_without_providers(Vec::new(), "topics");
        let result = chatbot.answer("  ", "question", &[]).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn score_clamp_applies_only_to_the_vector_path() {
        let ranked = |score: f32, distance: Option<f32>| RankedChunk {
            chunk: pointer_chunk(),
            score,
            distance,
        };

        let vector_sources = build_sources(&RetrievalResult {
            chunks: vec![ranked(1.4, Some(0.0))],
            strategy: RetrievalStrategy::Vector,
        });
        assert_eq!(vector_sources[0].relevance_score, 1.0);

        let keyword_sources = build_sources(&RetrievalResult {
            chunks: vec![ranked(14.0, None)],
            strategy: RetrievalStrategy::Keyword,
        });
        assert!((keyword_sources[0].relevance_score - 1.4).abs() < 1e-6);
    }
}
