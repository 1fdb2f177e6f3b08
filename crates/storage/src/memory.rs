//! In-memory backend for tests and offline prototyping.
//!
//! Beyond storing data it can simulate the failure modes the client has to
//! survive: missing sessions, failing endpoints, and slow responses.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use studio_core::model::{
    LessonContent, LessonRequest, ProgressUpdate, Roadmap, RoadmapId, TopicProgress, TopicRef,
};

use crate::repository::{
    LessonRepository, ProgressRepository, RoadmapRecord, RoadmapRepository, StorageError,
};

#[derive(Default)]
struct MemoryState {
    roadmaps: HashMap<RoadmapId, RoadmapRecord>,
    lessons: HashMap<(String, String), LessonContent>,
    progress: HashMap<RoadmapId, BTreeMap<TopicRef, bool>>,
    signed_out: bool,
    fail_lessons: bool,
    fail_progress_reads: bool,
    fail_progress_writes: bool,
    lesson_latency: Option<Duration>,
    progress_read_latency: Option<Duration>,
    write_delays: VecDeque<Duration>,
    lesson_requests: usize,
    write_log: Vec<ProgressUpdate>,
}

/// Shared in-memory backend; clones see the same state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn insert_roadmap(&self, roadmap: &Roadmap) {
        self.insert_roadmap_record(roadmap.id(), RoadmapRecord::from_roadmap(roadmap));
    }

    /// Store a raw payload, including shapes `Roadmap` itself would reject.
    pub fn insert_roadmap_record(&self, id: RoadmapId, record: RoadmapRecord) {
        self.with_state(|s| s.roadmaps.insert(id, record));
    }

    /// Script the lesson returned for an exact `(topic, context)` request.
    pub fn insert_lesson(&self, request: &LessonRequest, lesson: LessonContent) {
        self.with_state(|s| {
            s.lessons
                .insert((request.topic.clone(), request.context.clone()), lesson)
        });
    }

    pub fn set_progress(&self, roadmap_id: RoadmapId, topic: TopicRef, completed: bool) {
        self.with_state(|s| {
            s.progress
                .entry(roadmap_id)
                .or_default()
                .insert(topic, completed)
        });
    }

    /// Remote completion state for a topic; unknown rows read as incomplete.
    #[must_use]
    pub fn is_completed(&self, roadmap_id: RoadmapId, topic: TopicRef) -> bool {
        self.with_state(|s| {
            s.progress
                .get(&roadmap_id)
                .and_then(|rows| rows.get(&topic))
                .copied()
                .unwrap_or(false)
        })
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.with_state(|s| s.signed_out = !signed_in);
    }

    pub fn fail_lessons(&self, fail: bool) {
        self.with_state(|s| s.fail_lessons = fail);
    }

    pub fn fail_progress_reads(&self, fail: bool) {
        self.with_state(|s| s.fail_progress_reads = fail);
    }

    pub fn fail_progress_writes(&self, fail: bool) {
        self.with_state(|s| s.fail_progress_writes = fail);
    }

    pub fn set_lesson_latency(&self, latency: Duration) {
        self.with_state(|s| s.lesson_latency = Some(latency));
    }

    pub fn set_progress_read_latency(&self, latency: Duration) {
        self.with_state(|s| s.progress_read_latency = Some(latency));
    }

    /// Delay the next progress write by `delay`; queued delays are consumed in call order.
    pub fn push_write_delay(&self, delay: Duration) {
        self.with_state(|s| s.write_delays.push_back(delay));
    }

    /// Number of lesson generation calls received, including failed ones.
    #[must_use]
    pub fn lesson_requests(&self) -> usize {
        self.with_state(|s| s.lesson_requests)
    }

    /// Progress writes in the order they were applied.
    #[must_use]
    pub fn write_log(&self) -> Vec<ProgressUpdate> {
        self.with_state(|s| s.write_log.clone())
    }

    fn require_session(&self) -> Result<(), StorageError> {
        if self.with_state(|s| s.signed_out) {
            return Err(StorageError::Unauthenticated);
        }
        Ok(())
    }
}

#[async_trait]
impl RoadmapRepository for InMemoryBackend {
    async fn get_roadmap(&self, id: RoadmapId) -> Result<RoadmapRecord, StorageError> {
        self.with_state(|s| s.roadmaps.get(&id).cloned())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl LessonRepository for InMemoryBackend {
    async fn generate_lesson(
        &self,
        request: &LessonRequest,
    ) -> Result<LessonContent, StorageError> {
        self.require_session()?;
        let (fail, latency) = self.with_state(|s| {
            s.lesson_requests += 1;
            (s.fail_lessons, s.lesson_latency)
        });
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(StorageError::HttpStatus(500));
        }

        let scripted = self.with_state(|s| {
            s.lessons
                .get(&(request.topic.clone(), request.context.clone()))
                .cloned()
        });
        Ok(scripted.unwrap_or_else(|| LessonContent {
            title: request.topic.clone(),
            estimated_time: "15 mins".into(),
            content_markdown: format!("# {}\n\n{}", request.topic, request.context),
        }))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryBackend {
    async fn list_progress(
        &self,
        roadmap_id: RoadmapId,
    ) -> Result<Vec<TopicProgress>, StorageError> {
        self.require_session()?;
        if let Some(latency) = self.with_state(|s| s.progress_read_latency) {
            tokio::time::sleep(latency).await;
        }
        self.with_state(|s| {
            if s.fail_progress_reads {
                return Err(StorageError::HttpStatus(503));
            }
            Ok(s.progress
                .get(&roadmap_id)
                .map(|rows| {
                    rows.iter()
                        .map(|(topic, done)| TopicProgress {
                            module_index: topic.module(),
                            topic_index: topic.topic(),
                            is_completed: *done,
                        })
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    async fn upsert_progress(&self, update: &ProgressUpdate) -> Result<(), StorageError> {
        self.require_session()?;
        let (fail, delay) =
            self.with_state(|s| (s.fail_progress_writes, s.write_delays.pop_front()));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StorageError::HttpStatus(500));
        }

        self.with_state(|s| {
            s.progress
                .entry(update.roadmap_id)
                .or_default()
                .insert(update.topic(), update.is_completed);
            s.write_log.push(*update);
        });
        Ok(())
    }
}
