use thiserror::Error;

use crate::model::ids::{RoadmapId, TopicRef};
use crate::model::lesson::LessonKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoadmapError {
    #[error("roadmap content is missing its module list")]
    MissingModules,

    #[error("roadmap has no modules")]
    NoModules,

    #[error("module {index} has no topics")]
    EmptyModule { index: usize },
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// A titled, ordered group of topic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    title: String,
    topics: Vec<String>,
}

impl Module {
    #[must_use]
    pub fn new(title: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            title: title.into(),
            topics,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

//
// ─── ROADMAP ───────────────────────────────────────────────────────────────────
//

/// A generated curriculum: an ordered list of modules.
///
/// Read-only for the lifetime of a learning session. Module and topic
/// positions are part of topic identity, so the module list is never
/// reordered after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roadmap {
    id: RoadmapId,
    title: String,
    description: Option<String>,
    modules: Vec<Module>,
}

impl Roadmap {
    /// Build a roadmap from its parts.
    ///
    /// `modules` is `None` when the backend payload lacked `content.roadmap`.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapError` when the module list is missing, empty, or
    /// contains a module without topics.
    pub fn new(
        id: RoadmapId,
        title: impl Into<String>,
        description: Option<String>,
        modules: Option<Vec<Module>>,
    ) -> Result<Self, RoadmapError> {
        let modules = modules.ok_or(RoadmapError::MissingModules)?;
        if modules.is_empty() {
            return Err(RoadmapError::NoModules);
        }
        if let Some(index) = modules.iter().position(|m| m.topics.is_empty()) {
            return Err(RoadmapError::EmptyModule { index });
        }

        Ok(Self {
            id,
            title: title.into(),
            description,
            modules,
        })
    }

    #[must_use]
    pub fn id(&self) -> RoadmapId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    /// Total number of topics across all modules.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.modules.iter().map(Module::topic_count).sum()
    }

    #[must_use]
    pub fn contains(&self, topic: TopicRef) -> bool {
        self.topic_name(topic).is_some()
    }

    #[must_use]
    pub fn topic_name(&self, topic: TopicRef) -> Option<&str> {
        self.modules
            .get(topic.module())?
            .topics
            .get(topic.topic())
            .map(String::as_str)
    }

    /// The first topic of the first module.
    #[must_use]
    pub fn first_topic(&self) -> TopicRef {
        TopicRef::new(0, 0)
    }

    /// Iterate every topic position in roadmap order.
    pub fn topics(&self) -> impl Iterator<Item = TopicRef> + '_ {
        self.modules.iter().enumerate().flat_map(|(m, module)| {
            (0..module.topics.len()).map(move |t| TopicRef::new(m, t))
        })
    }

    /// Cache key for the lesson of `topic`.
    #[must_use]
    pub fn lesson_key(&self, topic: TopicRef) -> Option<LessonKey> {
        let module = self.modules.get(topic.module())?;
        let name = module.topics.get(topic.topic())?;
        Some(LessonKey::new(module.title.clone(), name.clone()))
    }

    /// Generation context sent alongside a lesson request: `"{roadmap} - {module}"`.
    #[must_use]
    pub fn lesson_context(&self, module: usize) -> Option<String> {
        let module = self.modules.get(module)?;
        Some(format!("{} - {}", self.title, module.title))
    }
}
