//! Knowledge-base and course-catalogue storage.
//!
//! The serving core talks to storage through the `ChunkStore` trait; the
//! shipped implementation is `JsonStorage`, a JSON-file map store.

mod json;

pub use json::JsonStorage;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::rag::types::Chunk;

/// Abstract interface to the per-course knowledge base.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// All chunks belonging to a course, unfiltered by embedding presence.
    async fn get_chunks(&self, course_id: &str) -> Result<Vec<Chunk>, ApiError>;

    /// One-line subject-area summary for fallback messaging. Always
    /// returns usable text, even for unknown courses.
    async fn topic_summary(&self, course_id: &str) -> String;

    /// Every chunk in the store, across courses (offline index builds).
    async fn all_chunks(&self) -> Result<Vec<Chunk>, ApiError>;

    /// Insert or replace chunks by id.
    async fn save_chunks(&self, chunks: Vec<Chunk>) -> Result<(), ApiError>;
}
