//! Flat L2 vector index with on-disk persistence.
//!
//! A brute-force nearest-neighbor adapter over squared L2 distance, the
//! same structure the knowledge-base embeddings were originally indexed
//! with. The index and its document metadata are persisted as two
//! co-located artifacts under a shared logical name; restoring missing or
//! inconsistent artifacts yields an empty, usable index.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use super::types::Chunk;

/// A search hit: the stored document plus its raw distance to the query.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub chunk: Chunk,
    pub distance: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentArtifact {
    documents: Vec<Chunk>,
}

#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    documents: Vec<Chunk>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append parallel vector/document sequences.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, documents: Vec<Chunk>) -> Result<(), ApiError> {
        if vectors.len() != documents.len() {
            return Err(ApiError::BadRequest(format!(
                "Vector/document length mismatch: {} != {}",
                vectors.len(),
                documents.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(ApiError::BadRequest(format!(
                    "Vector dimension mismatch: {} != {}",
                    vector.len(),
                    self.dimension
                )));
            }
        }

        self.vectors.extend(vectors);
        self.documents.extend(documents);
        Ok(())
    }

    /// Return up to `k` nearest entries matching the course filter, each
    /// annotated with its raw squared-L2 distance. An empty index returns
    /// an empty sequence.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        course_id: Option<&str>,
    ) -> Result<Vec<IndexHit>, ApiError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(ApiError::BadRequest(format!(
                "Query dimension mismatch: {} != {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vector)| (idx, l2_distance(query, vector)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let neighbors = k.min(self.len());
        let hits = scored
            .into_iter()
            .take(neighbors)
            .filter_map(|(idx, distance)| {
                let chunk = &self.documents[idx];
                match course_id {
                    Some(filter) if chunk.course_id != filter => None,
                    _ => Some(IndexHit {
                        chunk: chunk.clone(),
                        distance,
                    }),
                }
            })
            .take(k)
            .collect();

        Ok(hits)
    }

    /// Persist the index as `{name}.index` (little-endian f32 blob with a
    /// count/dimension header) plus `{name}_docs.json` (document metadata).
    pub fn persist(&self, dir: &Path, name: &str) -> Result<(), ApiError> {
        fs::create_dir_all(dir).map_err(ApiError::internal)?;

        let mut blob = Vec::with_capacity(8 + self.len() * self.dimension * 4);
        blob.extend_from_slice(&(self.len() as u32).to_le_bytes());
        blob.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        for vector in &self.vectors {
            for value in vector {
                blob.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(dir.join(format!("{name}.index")), blob).map_err(ApiError::internal)?;

        let artifact = DocumentArtifact {
            documents: self.documents.clone(),
        };
        let docs_json = serde_json::to_string_pretty(&artifact).map_err(ApiError::internal)?;
        fs::write(dir.join(format!("{name}_docs.json")), docs_json).map_err(ApiError::internal)?;

        tracing::info!("Persisted vector index '{}' ({} entries)", name, self.len());
        Ok(())
    }

    /// Restore an index from its persisted artifacts. Missing, unreadable,
    /// or mutually inconsistent artifacts leave the index empty rather
    /// than failing.
    pub fn restore(dir: &Path, name: &str, dimension: usize) -> Self {
        let index_path = dir.join(format!("{name}.index"));
        let docs_path = dir.join(format!("{name}_docs.json"));

        let Some((stored_dimension, vectors)) = read_index_blob(&index_path) else {
            return Self::new(dimension);
        };

        let documents = match fs::read_to_string(&docs_path)
            .ok()
            .and_then(|contents| serde_json::from_str::<DocumentArtifact>(&contents).ok())
        {
            Some(artifact) => artifact.documents,
            None => {
                tracing::warn!(
                    "Vector index '{}' has no readable document artifact; starting empty",
                    name
                );
                return Self::new(dimension);
            }
        };

        if documents.len() != vectors.len() {
            tracing::warn!(
                "Vector index '{}' artifacts disagree ({} vectors, {} documents); starting empty",
                name,
                vectors.len(),
                documents.len()
            );
            return Self::new(dimension);
        }

        tracing::info!("Loaded vector index '{}' ({} entries)", name, vectors.len());
        Self {
            dimension: stored_dimension,
            vectors,
            documents,
        }
    }
}

fn read_index_blob(path: &Path) -> Option<(usize, Vec<Vec<f32>>)> {
    let bytes = fs::read(path).ok()?;
    if bytes.len() < 8 {
        return None;
    }

    let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let dimension = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let data = &bytes[8..];
    if dimension == 0 || data.len() != count * dimension * 4 {
        tracing::warn!("Vector index blob at {} is malformed; ignoring", path.display());
        return None;
    }

    let mut vectors = Vec::with_capacity(count);
    for row in data.chunks_exact(dimension * 4) {
        let vector: Vec<f32> = row
            .chunks_exact(4)
            .map(|value| f32::from_le_bytes([value[0], value[1], value[2], value[3]]))
            .collect();
        vectors.push(vector);
    }

    Some((dimension, vectors))
}

fn l2_distance(query: &[f32], candidate: &[f32]) -> f32 {
    let query = ArrayView1::from(query);
    let candidate = ArrayView1::from(candidate);
    let diff = &query - &candidate;
    diff.dot(&diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, course_id: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            course_id: course_id.to_string(),
            content: format!("content of {id}"),
            topic: "topic".to_string(),
            module: None,
            timestamp: None,
            content_type: "text".to_string(),
            embedding: None,
        }
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(2);
        index
            .add(
                vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 3.0]],
                vec![
                    chunk("origin", "demo-101"),
                    chunk("unit-x", "demo-101"),
                    chunk("far-y", "other-202"),
                ],
            )
            .expect("add should succeed");
        index
    }

    #[test]
    fn search_returns_nearest_first_with_distances() {
        let index = sample_index();
        let hits = index.search(&[0.9, 0.0], 3, None).expect("search");

        assert_eq!(hits[0].chunk.chunk_id, "unit-x");
        assert!((hits[0].distance - 0.01).abs() < 1e-5);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn search_filters_by_course() {
        let index = sample_index();
        let hits = index
            .search(&[0.0, 2.0], 3, Some("other-202"))
            .expect("search");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.chunk_id, "far-y");
    }

    #[test]
    fn empty_index_returns_empty_hits() {
        let index = VectorIndex::new(4);
        let hits = index.search(&[0.0; 4], 5, None).expect("search");
        assert!(hits.is_empty());
    }

    #[test]
    fn add_rejects_mismatched_lengths() {
        let mut index = VectorIndex::new(2);
        let result = index.add(vec![vec![0.0, 0.0]], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn persist_and_restore_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = sample_index();
        index.persist(dir.path(), "kb").expect("persist");

        let restored = VectorIndex::restore(dir.path(), "kb", 2);
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.dimension(), 2);

        let hits = restored.search(&[0.9, 0.0], 1, None).expect("search");
        assert_eq!(hits[0].chunk.chunk_id, "unit-x");
    }

    #[test]
    fn restore_missing_artifacts_yields_empty_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let restored = VectorIndex::restore(dir.path(), "missing", 8);
        assert!(restored.is_empty());
        assert_eq!(restored.dimension(), 8);
    }

    #[test]
    fn restore_inconsistent_artifacts_yields_empty_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = sample_index();
        index.persist(dir.path(), "kb").expect("persist");

        // Truncate the document list so it disagrees with the blob.
        let docs_path = dir.path().join("kb_docs.json");
        std::fs::write(&docs_path, r#"{"documents": []}"#).expect("write");

        let restored = VectorIndex::restore(dir.path(), "kb", 2);
        assert!(restored.is_empty());
    }
}
