//! Shared error types for the services crate.

use thiserror::Error;

use storage::{ConfigError, HttpInitError, StorageError};
use studio_core::model::{RoadmapError, TopicRef};

/// Errors emitted by `LessonCache`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LessonError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("failed to load lesson: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for LessonError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unauthenticated => Self::NotAuthenticated,
            other => Self::Storage(other),
        }
    }
}

/// Errors emitted by `ProgressReconciler`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("topic {0} is not part of this roadmap")]
    UnknownTopic(TopicRef),
    #[error("learning session is closed")]
    Closed,
    #[error("failed to update progress: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ProgressError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unauthenticated => Self::NotAuthenticated,
            other => Self::Storage(other),
        }
    }
}

/// Errors emitted by `LearningSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to load roadmap: {0}")]
    RoadmapUnavailable(#[from] StorageError),
    #[error("malformed roadmap: {0}")]
    Roadmap(#[from] RoadmapError),
    #[error("topic {0} is not part of this roadmap")]
    UnknownTopic(TopicRef),
    #[error("learning session is closed")]
    Closed,
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping studio services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] HttpInitError),
}
