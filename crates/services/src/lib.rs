#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod studio;

pub use app_services::StudioServices;
pub use error::{LessonError, ProgressError, ServicesError, SessionError};
pub use studio::{LearningSession, LessonCache, LessonOutcome, LessonState, ProgressReconciler};
