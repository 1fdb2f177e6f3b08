use std::sync::Arc;

use studio_core::model::{LessonContent, TopicRef};

use crate::error::LessonError;

/// What the lesson pane should currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonState {
    Loading,
    Ready(Arc<LessonContent>),
    Failed(LessonError),
}

impl LessonState {
    #[must_use]
    pub fn lesson(&self) -> Option<&Arc<LessonContent>> {
        match self {
            Self::Ready(lesson) => Some(lesson),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Result of opening the active topic's lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonOutcome {
    /// The lesson was committed to the display state.
    Displayed(Arc<LessonContent>),
    /// The selection moved on (or the session closed) before the response
    /// arrived; nothing was displayed.
    Superseded { topic: TopicRef },
}

impl LessonOutcome {
    #[must_use]
    pub fn displayed(&self) -> Option<&Arc<LessonContent>> {
        match self {
            Self::Displayed(lesson) => Some(lesson),
            Self::Superseded { .. } => None,
        }
    }
}
