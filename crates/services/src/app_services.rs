use std::sync::Arc;

use storage::{ApiConfig, Backend, InMemoryBackend, SessionProvider};
use studio_core::model::RoadmapId;

use crate::error::{ServicesError, SessionError};
use crate::studio::LearningSession;

/// Assembles the backend once and hands out learning sessions over it.
#[derive(Clone)]
pub struct StudioServices {
    backend: Backend,
}

impl StudioServices {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Build services backed by the HTTP learning API.
    ///
    /// # Errors
    ///
    /// Returns `ServicesError` if the HTTP client cannot be built.
    pub fn http(
        config: &ApiConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, ServicesError> {
        Ok(Self::new(Backend::http(config, session)?))
    }

    /// Build HTTP services from `STUDIO_API_URL` / `STUDIO_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ServicesError` for invalid configuration or client setup.
    pub fn from_env(session: Arc<dyn SessionProvider>) -> Result<Self, ServicesError> {
        let config = ApiConfig::from_env()?;
        Self::http(&config, session)
    }

    #[must_use]
    pub fn in_memory(repo: &InMemoryBackend) -> Self {
        Self::new(Backend::in_memory(repo))
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Open a learning session for `roadmap_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the roadmap cannot be loaded or is malformed.
    pub async fn start_session(
        &self,
        roadmap_id: RoadmapId,
    ) -> Result<LearningSession, SessionError> {
        LearningSession::start(roadmap_id, &self.backend).await
    }
}
