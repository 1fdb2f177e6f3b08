use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_core::model::{
    LessonContent, LessonRequest, Module, ProgressUpdate, Roadmap, RoadmapError, RoadmapId,
    TopicProgress,
};
use thiserror::Error;

/// Errors surfaced by backend adapters.
///
/// `Clone` so a single failed request can be reported to every caller that
/// was waiting on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("no access token available")]
    Unauthenticated,

    #[error("request failed with status {0}")]
    HttpStatus(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── WIRE SHAPE ────────────────────────────────────────────────────────────────
//

/// Roadmap payload as returned by the backend.
///
/// The module list lives under `content.roadmap` and may be absent on
/// malformed or partially generated roadmaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapRecord {
    #[serde(default)]
    pub id: Option<RoadmapId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<RoadmapContentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapContentRecord {
    #[serde(default)]
    pub roadmap: Option<Vec<ModuleRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl RoadmapRecord {
    #[must_use]
    pub fn from_roadmap(roadmap: &Roadmap) -> Self {
        Self {
            id: Some(roadmap.id()),
            title: roadmap.title().to_owned(),
            description: roadmap.description().map(str::to_owned),
            content: Some(RoadmapContentRecord {
                roadmap: Some(
                    roadmap
                        .modules()
                        .iter()
                        .map(|m| ModuleRecord {
                            title: m.title().to_owned(),
                            topics: m.topics().to_vec(),
                        })
                        .collect(),
                ),
            }),
        }
    }

    /// Convert the record into a validated `Roadmap`.
    ///
    /// `requested` is used when the payload omits its own id.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapError` if the module list is missing or invalid.
    pub fn into_roadmap(self, requested: RoadmapId) -> Result<Roadmap, RoadmapError> {
        let modules = self.content.and_then(|c| c.roadmap).map(|modules| {
            modules
                .into_iter()
                .map(|m| Module::new(m.title, m.topics))
                .collect()
        });
        Roadmap::new(
            self.id.unwrap_or(requested),
            self.title,
            self.description,
            modules,
        )
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read-only access to generated roadmaps.
#[async_trait]
pub trait RoadmapRepository: Send + Sync {
    /// Fetch a roadmap by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other transport errors.
    async fn get_roadmap(&self, id: RoadmapId) -> Result<RoadmapRecord, StorageError>;
}

/// On-demand lesson generation.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Generate (or fetch) the lesson for a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unauthenticated` without a session token, or
    /// transport errors.
    async fn generate_lesson(&self, request: &LessonRequest)
    -> Result<LessonContent, StorageError>;
}

/// Persisted topic completion records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// List every completion row stored for a roadmap.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on auth or transport failures.
    async fn list_progress(&self, roadmap_id: RoadmapId)
    -> Result<Vec<TopicProgress>, StorageError>;

    /// Insert or update one completion row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on auth or transport failures.
    async fn upsert_progress(&self, update: &ProgressUpdate) -> Result<(), StorageError>;
}

/// Aggregates backend repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Backend {
    pub roadmaps: Arc<dyn RoadmapRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Backend {
    /// Build a `Backend` whose repositories all share `repo`.
    #[must_use]
    pub fn in_memory(repo: &crate::memory::InMemoryBackend) -> Self {
        let roadmaps: Arc<dyn RoadmapRepository> = Arc::new(repo.clone());
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        Self {
            roadmaps,
            lessons,
            progress,
        }
    }
}
