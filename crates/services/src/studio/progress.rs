use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use storage::ProgressRepository;
use studio_core::model::{CompletedTopics, ProgressUpdate, Roadmap, RoadmapProgress, TopicRef};
use tracing::{debug, info, warn};

use super::scope::SessionScope;
use crate::error::ProgressError;

type PendingLoad = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
struct ProgressState {
    /// What the UI shows, including optimistic toggles.
    local: CompletedTopics,
    /// Last state the remote store acknowledged.
    confirmed: CompletedTopics,
    /// Bumped on every toggle; a failed write only rolls back its own toggle.
    generations: HashMap<TopicRef, u64>,
}

/// Tracks completed topics for one roadmap with optimistic toggles.
///
/// Writes for the same topic are issued one at a time in toggle order, so the
/// remote store ends at the last requested state. A failed write restores the
/// topic to its last confirmed state unless a newer toggle has superseded it.
pub struct ProgressReconciler {
    roadmap: Arc<Roadmap>,
    store: Arc<dyn ProgressRepository>,
    state: Arc<Mutex<ProgressState>>,
    loading: Mutex<Option<PendingLoad>>,
    write_queues: Mutex<HashMap<TopicRef, Arc<tokio::sync::Mutex<()>>>>,
    scope: SessionScope,
}

impl ProgressReconciler {
    #[must_use]
    pub fn new(roadmap: Arc<Roadmap>, store: Arc<dyn ProgressRepository>) -> Self {
        Self {
            roadmap,
            store,
            state: Arc::new(Mutex::new(ProgressState::default())),
            loading: Mutex::new(None),
            write_queues: Mutex::new(HashMap::new()),
            scope: SessionScope::default(),
        }
    }

    #[must_use]
    pub(crate) fn with_scope(mut self, scope: SessionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Start fetching the persisted completion rows on a background task.
    ///
    /// Returns immediately. Until the rows arrive nothing reads as completed;
    /// toggles issued meanwhile wait for the load before flipping anything.
    pub fn begin_load(&self) {
        let pending = self.spawn_load();
        *self.loading.lock() = Some(pending);
    }

    /// Wait for the most recent `begin_load`, if any.
    pub async fn loaded(&self) {
        let pending = self.loading.lock().clone();
        if let Some(pending) = pending {
            pending.await;
        }
    }

    /// Fetch the persisted completion rows and wait for them.
    ///
    /// Never fails: if the store is unreachable the set stays empty and the
    /// session carries on.
    pub async fn load_progress(&self) -> CompletedTopics {
        self.begin_load();
        self.loaded().await;
        self.completed()
    }

    fn spawn_load(&self) -> PendingLoad {
        let roadmap = Arc::clone(&self.roadmap);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let scope = self.scope.clone();
        let task = tokio::spawn(async move {
            let roadmap_id = roadmap.id();
            let loaded = match store.list_progress(roadmap_id).await {
                Ok(records) => CompletedTopics::from_records(&roadmap, &records),
                Err(err) => {
                    warn!(%roadmap_id, error = %err, "progress unavailable, starting empty");
                    CompletedTopics::new()
                }
            };
            if !scope.is_open() {
                return;
            }
            info!(%roadmap_id, completed = loaded.len(), "progress loaded");
            let mut state = state.lock();
            state.local = loaded.clone();
            state.confirmed = loaded;
        });

        async move {
            if let Err(err) = task.await {
                warn!(error = %err, "progress load task did not finish");
            }
        }
        .boxed()
        .shared()
    }

    /// Flip completion for `topic` and persist the new state.
    ///
    /// The local set changes before the write is issued. Returns the new
    /// state once the store acknowledges it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownTopic` for positions outside the
    /// roadmap, `ProgressError::Closed` after the session ended, or the
    /// write failure after rolling back.
    pub async fn toggle(&self, topic: TopicRef) -> Result<bool, ProgressError> {
        if !self.roadmap.contains(topic) {
            return Err(ProgressError::UnknownTopic(topic));
        }
        if !self.scope.is_open() {
            return Err(ProgressError::Closed);
        }
        // Flipping against a half-loaded set would write the wrong state.
        self.loaded().await;

        let (completed, generation) = {
            let mut state = self.state.lock();
            let completed = !state.local.contains(topic);
            state.local.set(topic, completed);
            let generation = state.generations.entry(topic).or_insert(0);
            *generation += 1;
            (completed, *generation)
        };
        debug!(%topic, completed, "applied optimistic toggle");

        let queue = self.write_queue(topic);
        let result = {
            let _turn = queue.lock().await;
            self.store
                .upsert_progress(&ProgressUpdate::new(self.roadmap.id(), topic, completed))
                .await
        };

        if !self.scope.is_open() {
            return result.map(|()| completed).map_err(ProgressError::from);
        }

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                state.confirmed.set(topic, completed);
                Ok(completed)
            }
            Err(err) => {
                if state.generations.get(&topic) == Some(&generation) {
                    let confirmed = state.confirmed.contains(topic);
                    state.local.set(topic, confirmed);
                    warn!(%topic, error = %err, "progress write failed, rolled back");
                } else {
                    warn!(%topic, error = %err, "progress write failed, newer toggle pending");
                }
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn is_completed(&self, topic: TopicRef) -> bool {
        self.state.lock().local.contains(topic)
    }

    /// Snapshot of the locally visible completed set.
    #[must_use]
    pub fn completed(&self) -> CompletedTopics {
        self.state.lock().local.clone()
    }

    #[must_use]
    pub fn summary(&self) -> RoadmapProgress {
        RoadmapProgress::compute(&self.roadmap, &self.state.lock().local)
    }

    fn write_queue(&self, topic: TopicRef) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.write_queues.lock().entry(topic).or_default())
    }
}
