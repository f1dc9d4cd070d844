//! JSON-file storage: one map file per collection.
//!
//! Courses live in `courses.json`, knowledge chunks in
//! `knowledge_base.json`, both keyed by id. Missing or corrupted files
//! degrade to empty maps with a logged warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::types::{Chunk, Course};
use super::ChunkStore;

const COURSES_FILE: &str = "courses.json";
const KNOWLEDGE_BASE_FILE: &str = "knowledge_base.json";

const DEFAULT_TOPIC_SUMMARY: &str = "the topics covered in this course";

pub struct JsonStorage {
    storage_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            write_lock: Mutex::new(()),
        }
    }

    /// Create empty collection files for any that do not exist yet.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(ApiError::internal)?;

        for file in [COURSES_FILE, KNOWLEDGE_BASE_FILE] {
            let path = self.storage_dir.join(file);
            if !path.exists() {
                tokio::fs::write(&path, "{}")
                    .await
                    .map_err(ApiError::internal)?;
                tracing::info!("Created {}", file);
            }
        }

        Ok(())
    }

    fn courses_path(&self) -> PathBuf {
        self.storage_dir.join(COURSES_FILE)
    }

    fn knowledge_base_path(&self) -> PathBuf {
        self.storage_dir.join(KNOWLEDGE_BASE_FILE)
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let courses: BTreeMap<String, Course> = load_map(&self.courses_path()).await;
        Ok(courses.into_values().collect())
    }

    pub async fn find_course(&self, course_id: &str) -> Result<Option<Course>, ApiError> {
        let courses: BTreeMap<String, Course> = load_map(&self.courses_path()).await;
        Ok(courses.get(course_id).cloned())
    }

    pub async fn save_course(&self, mut course: Course) -> Result<String, ApiError> {
        if course.course_id.is_empty() {
            return Err(ApiError::BadRequest("course_id is required".to_string()));
        }
        if course.created_at.is_none() {
            course.created_at = Some(chrono::Utc::now().to_rfc3339());
        }

        let _guard = self.write_lock.lock().await;
        let mut courses: BTreeMap<String, Course> = load_map(&self.courses_path()).await;
        let course_id = course.course_id.clone();
        courses.insert(course_id.clone(), course);
        save_map(&self.courses_path(), &courses).await?;
        Ok(course_id)
    }
}

#[async_trait]
impl ChunkStore for JsonStorage {
    async fn get_chunks(&self, course_id: &str) -> Result<Vec<Chunk>, ApiError> {
        let chunks: BTreeMap<String, Chunk> = load_map(&self.knowledge_base_path()).await;
        Ok(chunks
            .into_values()
            .filter(|chunk| chunk.course_id == course_id)
            .collect())
    }

    async fn topic_summary(&self, course_id: &str) -> String {
        match self.find_course(course_id).await {
            Ok(Some(course)) => course
                .topic_summary
                .filter(|summary| !summary.is_empty())
                .unwrap_or_else(|| {
                    if course.description.is_empty() {
                        DEFAULT_TOPIC_SUMMARY.to_string()
                    } else {
                        course.description
                    }
                }),
            _ => DEFAULT_TOPIC_SUMMARY.to_string(),
        }
    }

    async fn all_chunks(&self) -> Result<Vec<Chunk>, ApiError> {
        let chunks: BTreeMap<String, Chunk> = load_map(&self.knowledge_base_path()).await;
        Ok(chunks.into_values().collect())
    }

    async fn save_chunks(&self, chunks: Vec<Chunk>) -> Result<(), ApiError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut stored: BTreeMap<String, Chunk> = load_map(&self.knowledge_base_path()).await;
        for mut chunk in chunks {
            if chunk.chunk_id.is_empty() {
                chunk.chunk_id = format!("{}_{}", chunk.course_id, Uuid::new_v4());
            }
            stored.insert(chunk.chunk_id.clone(), chunk);
        }
        save_map(&self.knowledge_base_path(), &stored).await?;
        Ok(())
    }
}

async fn load_map<T: DeserializeOwned>(path: &Path) -> BTreeMap<String, T> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(
                    "Failed to decode {}: {}; returning empty map",
                    path.display(),
                    err
                );
                BTreeMap::new()
            }
        },
        Err(_) => BTreeMap::new(),
    }
}

async fn save_map<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> Result<(), ApiError> {
    let contents = serde_json::to_string_pretty(map).map_err(ApiError::internal)?;
    tokio::fs::write(path, contents)
        .await
        .map_err(ApiError::internal)
}
