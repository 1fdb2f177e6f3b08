use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use studio_core::model::{LessonContent, LessonRequest, ProgressUpdate, RoadmapId, TopicProgress};
use thiserror::Error;
use tracing::debug;

use crate::auth::SessionProvider;
use crate::repository::{
    Backend, LessonRepository, ProgressRepository, RoadmapRecord, RoadmapRepository, StorageError,
};

mod config;
mod wire;

pub use config::{ApiConfig, ConfigError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Backend adapter speaking the learning API over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    api_root: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpBackend {
    /// Build an HTTP client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the TLS backend cannot be initialized.
    pub fn new(
        config: &ApiConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, HttpInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_root: config.api_root(),
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_root)
    }

    async fn bearer(&self) -> Result<String, StorageError> {
        self.session
            .access_token()
            .await
            .ok_or(StorageError::Unauthenticated)
    }
}

#[async_trait]
impl RoadmapRepository for HttpBackend {
    async fn get_roadmap(&self, id: RoadmapId) -> Result<RoadmapRecord, StorageError> {
        let url = self.endpoint(&format!("/roadmap/{id}"));
        debug!(%url, "fetching roadmap");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| wire::transport(&e))?;
        wire::decode(response).await
    }
}

#[async_trait]
impl LessonRepository for HttpBackend {
    async fn generate_lesson(
        &self,
        request: &LessonRequest,
    ) -> Result<LessonContent, StorageError> {
        let token = self.bearer().await?;
        let url = self.endpoint("/learning/lesson");
        debug!(%url, topic = %request.topic, "requesting lesson");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| wire::transport(&e))?;
        wire::decode(response).await
    }
}

#[async_trait]
impl ProgressRepository for HttpBackend {
    async fn list_progress(
        &self,
        roadmap_id: RoadmapId,
    ) -> Result<Vec<TopicProgress>, StorageError> {
        let token = self.bearer().await?;
        let url = self.endpoint(&format!("/learning/progress/{roadmap_id}"));
        debug!(%url, "fetching progress");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| wire::transport(&e))?;
        wire::decode(response).await
    }

    async fn upsert_progress(&self, update: &ProgressUpdate) -> Result<(), StorageError> {
        let token = self.bearer().await?;
        let url = self.endpoint("/learning/progress");
        debug!(
            %url,
            topic = %update.topic(),
            is_completed = update.is_completed,
            "writing progress"
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(update)
            .send()
            .await
            .map_err(|e| wire::transport(&e))?;
        // The ack body is opaque.
        wire::checked(response)?;
        Ok(())
    }
}

impl Backend {
    /// Build a `Backend` that talks to the learning API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be built.
    pub fn http(
        config: &ApiConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, HttpInitError> {
        let http = HttpBackend::new(config, session)?;
        let roadmaps: Arc<dyn RoadmapRepository> = Arc::new(http.clone());
        let lessons: Arc<dyn LessonRepository> = Arc::new(http.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(http);
        Ok(Self {
            roadmaps,
            lessons,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticSession;

    fn backend(token: Option<&str>) -> HttpBackend {
        let config = ApiConfig::new("http://127.0.0.1:9").unwrap();
        HttpBackend::new(&config, Arc::new(StaticSession::new(token.map(String::from)))).unwrap()
    }

    #[test]
    fn backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpBackend>();
    }

    #[test]
    fn endpoints_live_under_api_prefix() {
        let http = backend(None);
        assert_eq!(
            http.endpoint("/learning/lesson"),
            "http://127.0.0.1:9/api/v1/learning/lesson"
        );
    }

    #[tokio::test]
    async fn authenticated_calls_abort_without_token() {
        let http = backend(None);
        let err = http
            .generate_lesson(&LessonRequest::new("Ownership", "Rust - Basics"))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::Unauthenticated);

        let err = http.list_progress(RoadmapId::new(1)).await.unwrap_err();
        assert_eq!(err, StorageError::Unauthenticated);
    }
}
