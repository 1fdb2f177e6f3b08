mod lesson_cache;
mod progress;
mod scope;
mod service;
mod view;

// Public API of the learning studio.
pub use lesson_cache::LessonCache;
pub use progress::ProgressReconciler;
pub use service::LearningSession;
pub use view::{LessonOutcome, LessonState};
