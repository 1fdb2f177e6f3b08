//! Linear "next topic" sequencing through a roadmap.
//!
//! Strictly positional: completion state is ignored and there is no wraparound.

use crate::model::{Roadmap, TopicRef};

/// Returns the topic after `current`, or `None` at the end of the roadmap.
///
/// Moves to `(m, t + 1)` while the module has more topics, then to
/// `(m + 1, 0)`. Also returns `None` when `current` is not part of `roadmap`.
#[must_use]
pub fn next_topic(roadmap: &Roadmap, current: TopicRef) -> Option<TopicRef> {
    let module = roadmap.module(current.module())?;
    if current.topic() >= module.topic_count() {
        return None;
    }

    if current.topic() + 1 < module.topic_count() {
        return Some(TopicRef::new(current.module(), current.topic() + 1));
    }
    if current.module() + 1 < roadmap.modules().len() {
        return Some(TopicRef::new(current.module() + 1, 0));
    }
    None
}

/// True when `current` is the final topic of the final module.
#[must_use]
pub fn is_last_topic(roadmap: &Roadmap, current: TopicRef) -> bool {
    roadmap.contains(current) && next_topic(roadmap, current).is_none()
}
