//! Response composer: turns a ranked chunk list into a user-facing answer.
//!
//! With a generation provider ready, the answer is synthesized from the
//! top chunks under a no-fabrication instruction; on any failure the
//! composer degrades to a deterministic templated answer. An empty chunk
//! list always yields a usable fallback message.

use serde_json::Value;

use crate::llm::{Capability, ChatMessage, GenerationProvider};
use super::types::{RankedChunk, RetrievalResult};

/// How many top chunks ground a generated answer.
const GROUNDING_CHUNKS: usize = 3;
/// Preview length for related-information entries.
const RELATED_PREVIEW_CHARS: usize = 100;

/// Normalize a module label for display.
///
/// Integers become `"Module {n}"`, strings already starting with "module"
/// pass through, absent values become `"Module"`, anything else is
/// prefixed.
pub fn format_module(module: Option<&Value>) -> String {
    match module {
        None | Some(Value::Null) => "Module".to_string(),
        Some(Value::Number(number)) => format!("Module {number}"),
        Some(Value::String(label)) => {
            if label.to_lowercase().starts_with("module") {
                label.clone()
            } else {
                format!("Module {label}")
            }
        }
        Some(other) => format!("Module {other}"),
    }
}

pub struct ResponseComposer {
    generator: Capability<dyn GenerationProvider>,
}

impl ResponseComposer {
    pub fn new(generator: Capability<dyn GenerationProvider>) -> Self {
        Self { generator }
    }

    /// Compose the answer text for a query. Never empty, never fails.
    pub async fn compose(
        &self,
        query: &str,
        history: &[ChatMessage],
        result: &RetrievalResult,
        topic_summary: &str,
    ) -> String {
        if result.is_empty() {
            return fallback_message(topic_summary);
        }

        if let Capability::Ready(generator) = &self.generator {
            match self
                .generate_answer(generator.as_ref(), query, history, &result.chunks)
                .await
            {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => {
                    tracing::warn!("Generation returned an empty answer; using templated response")
                }
                Err(err) => {
                    tracing::warn!("Generation failed ({}); using templated response", err)
                }
            }
        }

        templated_answer(&result.chunks)
    }

    async fn generate_answer(
        &self,
        generator: &dyn GenerationProvider,
        query: &str,
        history: &[ChatMessage],
        chunks: &[RankedChunk],
    ) -> Result<String, crate::llm::ProviderError> {
        let context = grounding_context(chunks);
        let system_context = format!(
            "You are a helpful learning assistant for a course. \
             Answer the user's question using only the course material below. \
             Cite the module each fact comes from. \
             If the material does not contain the answer, say that you do not \
             have that information instead of inventing one.\n\nCourse material:\n{context}"
        );

        let mut messages: Vec<ChatMessage> = history.to_vec();
        messages.push(ChatMessage::new("user", query));

        generator.generate(&system_context, &messages).await
    }
}

fn grounding_context(chunks: &[RankedChunk]) -> String {
    chunks
        .iter()
        .take(GROUNDING_CHUNKS)
        .enumerate()
        .map(|(i, ranked)| {
            format!(
                "[{}] ({})\n{}",
                i + 1,
                format_module(ranked.chunk.module.as_ref()),
                ranked.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn templated_answer(chunks: &[RankedChunk]) -> String {
    let top = &chunks[0];
    let module = format_module(top.chunk.module.as_ref());
    let source_line = match &top.chunk.timestamp {
        Some(timestamp) => format!("*Source: {module} (Timestamp: {timestamp})*"),
        None => format!("*Source: {module}*"),
    };

    let mut response = format!(
        "Based on the course materials, here's what I found:\n\n\
         **{}**\n\n{}\n",
        top.chunk.content, source_line
    );

    if chunks.len() > 1 {
        response.push_str("\n**Related Information:**\n");
        for ranked in &chunks[1..] {
            response.push_str(&format!(
                "- {}... _{}_\n",
                preview(&ranked.chunk.content),
                format_module(ranked.chunk.module.as_ref())
            ));
        }
    }

    response.push_str("\nWould you like me to elaborate on any specific aspect?");
    response
}

fn preview(content: &str) -> String {
    content.chars().take(RELATED_PREVIEW_CHARS).collect()
}

fn fallback_message(topic_summary: &str) -> String {
    format!(
        "I don't have specific information about that in my knowledge base \
         for this course.\n\n\
         Here's what I can help you with:\n- {topic_summary}\n\n\
         Could you rephrase your question or ask about a specific topic from \
         the course? I'll do my best to help!"
    )
}
