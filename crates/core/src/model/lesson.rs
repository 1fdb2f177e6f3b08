use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key for generated lesson content.
///
/// Equality and hashing are field-wise. The `Display` form joins the fields
/// with `-` for log output only; two different keys can render to the same
/// string (for example `("A-X", "Y")` and `("A", "X-Y")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LessonKey {
    module_title: String,
    topic: String,
}

impl LessonKey {
    #[must_use]
    pub fn new(module_title: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            module_title: module_title.into(),
            topic: topic.into(),
        }
    }

    #[must_use]
    pub fn module_title(&self) -> &str {
        &self.module_title
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for LessonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.module_title, self.topic)
    }
}

/// Body of a lesson generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub topic: String,
    pub context: String,
}

impl LessonRequest {
    #[must_use]
    pub fn new(topic: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            context: context.into(),
        }
    }
}

/// Generated lesson material for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub title: String,
    /// Free-form reading time, e.g. `"15 mins"`.
    pub estimated_time: String,
    pub content_markdown: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn colliding_display_strings_are_distinct_keys() {
        let a = LessonKey::new("A-X", "Y");
        let b = LessonKey::new("A", "X-Y");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn lesson_content_reads_backend_shape() {
        let json = r##"{"title":"Ownership","estimated_time":"15 mins","content_markdown":"# Ownership"}"##;
        let lesson: LessonContent = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.title, "Ownership");
        assert_eq!(lesson.estimated_time, "15 mins");
        assert_eq!(lesson.content_markdown, "# Ownership");
    }
}
