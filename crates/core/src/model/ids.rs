use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifier for a roadmap.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadmapId(u64);

impl RoadmapId {
    /// Creates a new `RoadmapId`
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RoadmapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoadmapId({})", self.0)
    }
}

impl fmt::Display for RoadmapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing a roadmap id from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse RoadmapId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for RoadmapId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RoadmapId::new)
            .map_err(|_| ParseIdError { raw: s.to_string() })
    }
}

// ─── Topic Reference ───────────────────────────────────────────────────────────

/// Position of a topic inside a roadmap: module index plus topic index.
///
/// Topics have no identity outside their module's position, so this pair is
/// the key for completion tracking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicRef {
    module: usize,
    topic: usize,
}

impl TopicRef {
    #[must_use]
    pub const fn new(module: usize, topic: usize) -> Self {
        Self { module, topic }
    }

    #[must_use]
    pub fn module(&self) -> usize {
        self.module
    }

    #[must_use]
    pub fn topic(&self) -> usize {
        self.topic
    }
}

impl fmt::Debug for TopicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicRef({}, {})", self.module, self.topic)
    }
}

impl fmt::Display for TopicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.module, self.topic)
    }
}

/// Error type for parsing a `"{module}-{topic}"` reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected <module>-<topic>, got {raw:?}")]
pub struct ParseTopicRefError {
    raw: String,
}

impl FromStr for TopicRef {
    type Err = ParseTopicRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTopicRefError { raw: s.to_string() };
        let (module, topic) = s.trim().split_once('-').ok_or_else(err)?;
        let module = module.parse::<usize>().map_err(|_| err())?;
        let topic = topic.parse::<usize>().map_err(|_| err())?;
        Ok(Self::new(module, topic))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
