//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `Retriever`: layered retrieval (vector search with keyword fallback)
//! - `VectorIndex`: flat nearest-neighbor index with persistence
//! - `ResponseComposer`: templated or LLM-synthesized answers
//! - `RagChatbot`: the end-to-end answer pipeline

pub mod chatbot;
pub mod composer;
pub mod index;
pub mod keyword;
pub mod retriever;
pub mod types;

pub use chatbot::RagChatbot;
pub use index::VectorIndex;
pub use retriever::Retriever;
pub use types::{Answer, Chunk, Course, RankedChunk, RetrievalResult, RetrievalStrategy, SourceRef};
