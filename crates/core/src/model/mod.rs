mod ids;
mod lesson;
mod progress;
mod roadmap;

pub use ids::{ParseIdError, ParseTopicRefError, RoadmapId, TopicRef};
pub use lesson::{LessonContent, LessonKey, LessonRequest};
pub use progress::{CompletedTopics, ModuleProgress, ProgressUpdate, RoadmapProgress, TopicProgress};
pub use roadmap::{Module, Roadmap, RoadmapError};
