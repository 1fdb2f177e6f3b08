use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use storage::{LessonRepository, StorageError};
use studio_core::model::{LessonContent, LessonKey, LessonRequest};
use tracing::{debug, warn};

use crate::error::LessonError;

type PendingLesson = Shared<BoxFuture<'static, Result<Arc<LessonContent>, StorageError>>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<LessonKey, Arc<LessonContent>>,
    in_flight: HashMap<LessonKey, PendingLesson>,
}

/// Session-scoped cache of generated lessons.
///
/// Unbounded and memory-only: a roadmap holds tens of topics and the cache
/// is dropped with its session. Concurrent misses for one key share a
/// single request, and failures are never stored.
pub struct LessonCache {
    source: Arc<dyn LessonRepository>,
    state: Arc<Mutex<CacheState>>,
}

impl LessonCache {
    #[must_use]
    pub fn new(source: Arc<dyn LessonRepository>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Cached lesson for `key`, if any. Never touches the network.
    #[must_use]
    pub fn get(&self, key: &LessonKey) -> Option<Arc<LessonContent>> {
        self.state.lock().entries.get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Return the cached lesson for `key`, generating it on a miss.
    ///
    /// `context` is only sent when a request is actually issued. A hit
    /// returns the same `Arc` every time.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::NotAuthenticated` without a session token, or
    /// `LessonError::Storage` when the request fails. Nothing is cached on
    /// failure, so calling again retries.
    pub async fn fetch_or_get(
        &self,
        key: &LessonKey,
        context: &str,
    ) -> Result<Arc<LessonContent>, LessonError> {
        let pending = {
            let mut state = self.state.lock();
            if let Some(hit) = state.entries.get(key) {
                debug!(%key, "lesson cache hit");
                return Ok(Arc::clone(hit));
            }
            if let Some(pending) = state.in_flight.get(key) {
                debug!(%key, "joining in-flight lesson request");
                pending.clone()
            } else {
                debug!(%key, "lesson cache miss");
                let request = LessonRequest::new(key.topic(), context);
                let pending = self.spawn_request(key.clone(), request);
                state.in_flight.insert(key.clone(), pending.clone());
                pending
            }
        };

        pending.await.map_err(LessonError::from)
    }

    // Runs on its own task so the result lands in the cache even if every
    // caller stops waiting.
    fn spawn_request(&self, key: LessonKey, request: LessonRequest) -> PendingLesson {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            // A panicking source must still clear its in-flight entry.
            let result = AssertUnwindSafe(source.generate_lesson(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(StorageError::Connection("lesson request panicked".into())))
                .map(Arc::new);
            let mut state = state.lock();
            state.in_flight.remove(&key);
            match result {
                Ok(lesson) => Ok(Arc::clone(state.entries.entry(key).or_insert(lesson))),
                Err(err) => {
                    warn!(%key, error = %err, "lesson request failed");
                    Err(err)
                }
            }
        });

        async move {
            task.await
                .unwrap_or_else(|join| Err(StorageError::Connection(join.to_string())))
        }
        .boxed()
        .shared()
    }
}
