//! Data model for the retrieval engine and the chat contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_content_type() -> String {
    "text".to_string()
}

/// A unit of retrievable course content with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable unique identifier.
    pub chunk_id: String,
    /// Owning course; every chunk belongs to exactly one course.
    pub course_id: String,
    /// Text body.
    pub content: String,
    /// Short label used to boost lexical relevance.
    #[serde(default)]
    pub topic: String,
    /// Module label as ingested: an integer module number, a display
    /// string, or absent. Normalized to "Module N" form at display time
    /// only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<Value>,
    /// Optional provenance marker (e.g. a video offset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Content category tag (transcript, pdf, url-reference, ...).
    #[serde(rename = "type", default = "default_content_type")]
    pub content_type: String,
    /// Embedding vector, present once the offline generator has run.
    /// Chunks without one are eligible only for keyword search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|emb| !emb.is_empty())
    }
}

/// A chunk annotated with a relevance score, and with the raw distance
/// when it came out of the vector index.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: Chunk,
    /// Non-negative; higher is more relevant.
    pub score: f32,
    /// Raw nearest-neighbor distance; lower is more relevant. Only set on
    /// the vector path, where `score = 1 / (1 + distance)`.
    pub distance: Option<f32>,
}

/// Which retrieval strategy produced a result. The two strategies score on
/// different, non-interchangeable scales, so downstream consumers need to
/// know which one ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    Vector,
    Keyword,
}

/// Ordered retrieval output: descending by score, at most `top_k` entries,
/// possibly empty.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunks: Vec<RankedChunk>,
    pub strategy: RetrievalStrategy,
}

impl RetrievalResult {
    pub fn empty(strategy: RetrievalStrategy) -> Self {
        Self {
            chunks: Vec::new(),
            strategy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Source citation attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub module: String,
    pub timestamp: Option<String>,
    pub content_type: String,
    pub relevance_score: f32,
}

/// The response contract: always fully populated, even in degraded modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub message: String,
    pub sources: Vec<SourceRef>,
    pub course_id: String,
}

/// A course record from the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// One-line subject-area summary used in fallback answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_deserializes_with_defaults() {
        let chunk: Chunk = serde_json::from_str(
            r#"{
                "chunk_id": "c1",
                "course_id": "demo-101",
                "content": "Pointers store memory addresses."
            }"#,
        )
        .expect("minimal chunk should parse");

        assert_eq!(chunk.content_type, "text");
        assert_eq!(chunk.topic, "");
        assert!(chunk.module.is_none());
        assert!(!chunk.has_embedding());
    }

    #[test]
    fn chunk_type_field_round_trips_under_original_name() {
        let chunk = Chunk {
            chunk_id: "c1".to_string(),
            course_id: "demo-101".to_string(),
            content: "body".to_string(),
            topic: "topic".to_string(),
            module: Some(serde_json::json!(2)),
            timestamp: Some("12:34".to_string()),
            content_type: "transcript".to_string(),
            embedding: None,
        };

        let value = serde_json::to_value(&chunk).expect("serialize");
        assert_eq!(value["type"], "transcript");
        assert!(value.get("embedding").is_none());
    }
}
