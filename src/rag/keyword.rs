//! Keyword ranker: the always-available lexical fallback.
//!
//! Pure function, no I/O, deterministic for a given chunk set and query.

use std::cmp::Ordering;

use super::types::{Chunk, RankedChunk};

/// Score chunks by lexical overlap with the query and return the top `top_k`.
///
/// The query is lower-cased, split on whitespace, and each token stripped
/// of leading/trailing punctuation (so "pointers?" still matches a
/// "pointers" topic). Each token found in a chunk's content contributes 2
/// points, each token found in its topic contributes 3. Tokens are not
/// deduplicated, so repeated words weigh proportionally. Chunks scoring 0
/// are dropped; ties keep their original relative order.
pub fn rank_by_keywords(chunks: &[Chunk], query: &str, top_k: usize) -> Vec<RankedChunk> {
    let query_lower = query.to_lowercase();
    let tokens: Vec<&str> = query_lower
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<RankedChunk> = Vec::new();
    for chunk in chunks {
        let content_lower = chunk.content.to_lowercase();
        let topic_lower = chunk.topic.to_lowercase();

        let mut score = 0u32;
        for token in &tokens {
            if content_lower.contains(token) {
                score += 2;
            }
            if topic_lower.contains(token) {
                score += 3;
            }
        }

        if score > 0 {
            scored.push(RankedChunk {
                chunk: chunk.clone(),
                score: score as f32,
                distance: None,
            });
        }
    }

    // Vec::sort_by is stable, so equal scores preserve insertion order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str, topic: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            course_id: "demo-101".to_string(),
            content: content.to_string(),
            topic: topic.to_string(),
            module: None,
            timestamp: None,
            content_type: "text".to_string(),
            embedding: None,
        }
    }

    #[test]
    fn topic_match_outscores_content_only_match() {
        let chunks = vec![
            chunk("content-only", "pointers are variables", "syntax"),
            chunk("topic-match", "they hold addresses", "pointers"),
        ];

        let ranked = rank_by_keywords(&chunks, "pointers", 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.chunk_id, "topic-match");
        assert_eq!(ranked[0].score, 3.0);
        assert_eq!(ranked[1].score, 2.0);
    }

    #[test]
    fn zero_score_chunks_are_dropped() {
        let chunks = vec![chunk("c1", "unrelated text", "other")];
        let ranked = rank_by_keywords(&chunks, "pointers", 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn empty_query_yields_empty_result() {
        let chunks = vec![chunk("c1", "anything", "anything")];
        assert!(rank_by_keywords(&chunks, "", 10).is_empty());
        assert!(rank_by_keywords(&chunks, "   ", 10).is_empty());
        assert!(rank_by_keywords(&chunks, "?! ...", 10).is_empty());
    }

    #[test]
    fn punctuation_on_query_tokens_is_ignored() {
        let chunks = vec![chunk(
            "c1",
            "Pointers store memory addresses.",
            "pointers",
        )];

        let ranked = rank_by_keywords(&chunks, "What are pointers?", 10);

        assert_eq!(ranked.len(), 1);
        // "pointers" hits both content (2) and topic (3).
        assert_eq!(ranked[0].score, 5.0);
    }

    #[test]
    fn repeated_query_tokens_add_linearly() {
        let chunks = vec![chunk("c1", "pointers everywhere", "misc")];

        let once = rank_by_keywords(&chunks, "pointers", 10);
        let twice = rank_by_keywords(&chunks, "pointers pointers", 10);

        assert_eq!(once[0].score, 2.0);
        assert_eq!(twice[0].score, 4.0);
    }

    #[test]
    fn ties_preserve_original_chunk_order() {
        let chunks = vec![
            chunk("first", "stack memory", "intro"),
            chunk("second", "heap memory", "intro"),
            chunk("third", "static memory", "intro"),
        ];

        let ranked = rank_by_keywords(&chunks, "memory", 10);

        let order: Vec<&str> = ranked
            .iter()
            .map(|ranked| ranked.chunk.chunk_id.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn ranking_is_deterministic() {
        let chunks = vec![
            chunk("a", "loops and branches", "control flow"),
            chunk("b", "loops loop loops", "loops"),
            chunk("c", "functions", "basics"),
        ];

        let first = rank_by_keywords(&chunks, "loops flow", 10);
        let second = rank_by_keywords(&chunks, "loops flow", 10);

        let ids = |ranked: &[RankedChunk]| {
            ranked
                .iter()
                .map(|r| (r.chunk.chunk_id.clone(), r.score))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn result_is_truncated_to_top_k() {
        let chunks = vec![
            chunk("a", "memory", "intro"),
            chunk("b", "memory memory", "intro"),
            chunk("c", "memory", "memory"),
        ];

        let ranked = rank_by_keywords(&chunks, "memory", 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.chunk_id, "c");
    }
}
