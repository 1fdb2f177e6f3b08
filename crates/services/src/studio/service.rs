use std::sync::Arc;

use parking_lot::Mutex;
use storage::{Backend, LessonRepository, ProgressRepository};
use studio_core::model::{CompletedTopics, Roadmap, RoadmapId, RoadmapProgress, TopicRef};
use studio_core::navigation;
use tracing::{debug, info};

use super::lesson_cache::LessonCache;
use super::progress::ProgressReconciler;
use super::scope::SessionScope;
use super::view::{LessonOutcome, LessonState};
use crate::error::SessionError;

//
// ─── DISPLAY STATE ─────────────────────────────────────────────────────────────
//

struct DisplayState {
    active: TopicRef,
    /// Incremented on every selection; responses started under an older
    /// epoch are not committed.
    epoch: u64,
    lesson: LessonState,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learning-studio view over a roadmap.
///
/// Owns the lesson cache, the progress reconciler and the active selection.
/// Everything is private to the session and dropped with it.
pub struct LearningSession {
    roadmap: Arc<Roadmap>,
    lessons: LessonCache,
    progress: ProgressReconciler,
    display: Mutex<DisplayState>,
    scope: SessionScope,
}

impl LearningSession {
    /// Load the roadmap and open a session on its first topic.
    ///
    /// Persisted progress is fetched in the background so a slow progress
    /// endpoint never holds up the first lesson; see `wait_for_progress`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RoadmapUnavailable` if the roadmap cannot be
    /// fetched and `SessionError::Roadmap` if its shape is malformed. A
    /// failed progress load is not an error; the session keeps nothing
    /// completed.
    pub async fn start(roadmap_id: RoadmapId, backend: &Backend) -> Result<Self, SessionError> {
        let record = backend.roadmaps.get_roadmap(roadmap_id).await?;
        let roadmap = Arc::new(record.into_roadmap(roadmap_id)?);
        let session = Self::new(
            roadmap,
            Arc::clone(&backend.lessons),
            Arc::clone(&backend.progress),
        );
        session.progress.begin_load();

        info!(
            %roadmap_id,
            modules = session.roadmap.modules().len(),
            topics = session.roadmap.topic_count(),
            "learning session started"
        );
        Ok(session)
    }

    /// Build a session over an already loaded roadmap without fetching progress.
    #[must_use]
    pub fn new(
        roadmap: Arc<Roadmap>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        let scope = SessionScope::default();
        let progress =
            ProgressReconciler::new(Arc::clone(&roadmap), progress).with_scope(scope.clone());
        Self {
            display: Mutex::new(DisplayState {
                active: roadmap.first_topic(),
                epoch: 0,
                lesson: LessonState::Loading,
            }),
            roadmap,
            lessons: LessonCache::new(lessons),
            progress,
            scope,
        }
    }

    #[must_use]
    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    #[must_use]
    pub fn active_topic(&self) -> TopicRef {
        self.display.lock().active
    }

    #[must_use]
    pub fn lesson_state(&self) -> LessonState {
        self.display.lock().lesson.clone()
    }

    #[must_use]
    pub fn cached_lessons(&self) -> usize {
        self.lessons.len()
    }

    /// Make `topic` the active selection.
    ///
    /// Shows a cached lesson immediately; otherwise the lesson pane goes to
    /// `Loading` until `open_lesson` resolves.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownTopic` for positions outside the roadmap
    /// and `SessionError::Closed` after `close`.
    pub fn select_topic(&self, topic: TopicRef) -> Result<(), SessionError> {
        self.ensure_open()?;
        let key = self
            .roadmap
            .lesson_key(topic)
            .ok_or(SessionError::UnknownTopic(topic))?;
        let cached = self.lessons.get(&key);

        let mut view = self.display.lock();
        view.active = topic;
        view.epoch += 1;
        view.lesson = cached.map_or(LessonState::Loading, LessonState::Ready);
        let epoch = view.epoch;
        debug!(%topic, epoch, "topic selected");
        Ok(())
    }

    /// Fetch (or reuse) the lesson for the active topic and display it.
    ///
    /// If the selection changes or the session closes while the request is
    /// in flight, the response is kept in the cache but not displayed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Lesson` when the lesson for the still-active
    /// topic cannot be loaded; the pane shows `LessonState::Failed` and the
    /// caller may retry by opening again.
    pub async fn open_lesson(&self) -> Result<LessonOutcome, SessionError> {
        self.ensure_open()?;
        let (topic, epoch) = {
            let view = self.display.lock();
            (view.active, view.epoch)
        };
        let key = self
            .roadmap
            .lesson_key(topic)
            .ok_or(SessionError::UnknownTopic(topic))?;
        let context = self
            .roadmap
            .lesson_context(topic.module())
            .ok_or(SessionError::UnknownTopic(topic))?;

        let result = self.lessons.fetch_or_get(&key, &context).await;

        let mut view = self.display.lock();
        if !self.scope.is_open() || view.epoch != epoch {
            debug!(%topic, "discarding lesson for abandoned selection");
            return Ok(LessonOutcome::Superseded { topic });
        }
        match result {
            Ok(lesson) => {
                view.lesson = LessonState::Ready(Arc::clone(&lesson));
                Ok(LessonOutcome::Displayed(lesson))
            }
            Err(err) => {
                view.lesson = LessonState::Failed(err.clone());
                Err(err.into())
            }
        }
    }

    /// Select the next topic in roadmap order.
    ///
    /// Returns `None` at the final topic, leaving the selection unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after `close`.
    pub fn advance(&self) -> Result<Option<TopicRef>, SessionError> {
        self.ensure_open()?;
        let Some(next) = navigation::next_topic(&self.roadmap, self.active_topic()) else {
            return Ok(None);
        };
        self.select_topic(next)?;
        Ok(Some(next))
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        navigation::next_topic(&self.roadmap, self.active_topic()).is_some()
    }

    /// Toggle completion of the active topic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` when the write fails (after rollback).
    pub async fn toggle_active(&self) -> Result<bool, SessionError> {
        let topic = self.active_topic();
        self.toggle(topic).await
    }

    /// Toggle completion of any topic in the roadmap.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` for unknown topics or failed writes.
    pub async fn toggle(&self, topic: TopicRef) -> Result<bool, SessionError> {
        Ok(self.progress.toggle(topic).await?)
    }

    #[must_use]
    pub fn is_completed(&self, topic: TopicRef) -> bool {
        self.progress.is_completed(topic)
    }

    /// Wait until persisted progress has been loaded (or given up on).
    pub async fn wait_for_progress(&self) -> CompletedTopics {
        self.progress.loaded().await;
        self.progress.completed()
    }

    #[must_use]
    pub fn completed_topics(&self) -> CompletedTopics {
        self.progress.completed()
    }

    #[must_use]
    pub fn progress(&self) -> RoadmapProgress {
        self.progress.summary()
    }

    /// End the session. In-flight requests still finish, but their results
    /// no longer change session state.
    pub fn close(&self) {
        self.scope.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.scope.is_open()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.scope.is_open() {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }
}
