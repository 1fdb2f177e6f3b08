use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::{RoadmapId, TopicRef};
use crate::model::roadmap::Roadmap;

//
// ─── WIRE RECORDS ──────────────────────────────────────────────────────────────
//

/// One persisted completion row for a roadmap topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub module_index: usize,
    pub topic_index: usize,
    pub is_completed: bool,
}

impl TopicProgress {
    #[must_use]
    pub fn topic(&self) -> TopicRef {
        TopicRef::new(self.module_index, self.topic_index)
    }
}

/// Upsert body for a single completion change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub roadmap_id: RoadmapId,
    pub module_index: usize,
    pub topic_index: usize,
    pub is_completed: bool,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(roadmap_id: RoadmapId, topic: TopicRef, is_completed: bool) -> Self {
        Self {
            roadmap_id,
            module_index: topic.module(),
            topic_index: topic.topic(),
            is_completed,
        }
    }

    #[must_use]
    pub fn topic(&self) -> TopicRef {
        TopicRef::new(self.module_index, self.topic_index)
    }
}

//
// ─── COMPLETED SET ─────────────────────────────────────────────────────────────
//

/// Topics marked complete for one roadmap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedTopics {
    topics: BTreeSet<TopicRef>,
}

impl CompletedTopics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize the set from persisted rows.
    ///
    /// Rows that are not completed, or that point outside `roadmap`, are skipped.
    #[must_use]
    pub fn from_records(roadmap: &Roadmap, records: &[TopicProgress]) -> Self {
        let topics = records
            .iter()
            .filter(|record| record.is_completed)
            .map(TopicProgress::topic)
            .filter(|topic| roadmap.contains(*topic))
            .collect();
        Self { topics }
    }

    #[must_use]
    pub fn contains(&self, topic: TopicRef) -> bool {
        self.topics.contains(&topic)
    }

    /// Set membership for `topic`; returns the previous membership.
    pub fn set(&mut self, topic: TopicRef, completed: bool) -> bool {
        if completed {
            !self.topics.insert(topic)
        } else {
            self.topics.remove(&topic)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TopicRef> + '_ {
        self.topics.iter().copied()
    }
}

//
// ─── AGGREGATED VIEW ───────────────────────────────────────────────────────────
//

/// Completion counts for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    pub title: String,
    pub total: usize,
    pub completed: usize,
}

/// Aggregated view of roadmap progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapProgress {
    pub total: usize,
    pub completed: usize,
    pub modules: Vec<ModuleProgress>,
    pub is_complete: bool,
}

impl RoadmapProgress {
    #[must_use]
    pub fn compute(roadmap: &Roadmap, completed: &CompletedTopics) -> Self {
        let modules: Vec<ModuleProgress> = roadmap
            .modules()
            .iter()
            .enumerate()
            .map(|(m, module)| ModuleProgress {
                title: module.title().to_string(),
                total: module.topic_count(),
                completed: (0..module.topic_count())
                    .filter(|t| completed.contains(TopicRef::new(m, *t)))
                    .count(),
            })
            .collect();
        let total = modules.iter().map(|m| m.total).sum();
        let done = modules.iter().map(|m| m.completed).sum();

        Self {
            total,
            completed: done,
            modules,
            is_complete: total > 0 && done == total,
        }
    }

    /// Whole-number completion percentage, rounded down.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.saturating_mul(100) / self.total;
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Module;

    fn roadmap() -> Roadmap {
        Roadmap::new(
            RoadmapId::new(9),
            "Go",
            None,
            Some(vec![
                Module::new("Intro", vec!["a".into(), "b".into()]),
                Module::new("Deep", vec!["c".into()]),
            ]),
        )
        .unwrap()
    }

    fn row(module_index: usize, topic_index: usize, is_completed: bool) -> TopicProgress {
        TopicProgress {
            module_index,
            topic_index,
            is_completed,
        }
    }

    #[test]
    fn from_records_keeps_completed_rows_inside_roadmap() {
        let records = [
            row(0, 0, true),
            row(0, 1, false),
            row(1, 5, true),
            row(4, 0, true),
        ];
        let set = CompletedTopics::from_records(&roadmap(), &records);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![TopicRef::new(0, 0)]);
    }

    #[test]
    fn set_reports_previous_membership() {
        let mut set = CompletedTopics::new();
        assert!(!set.set(TopicRef::new(0, 0), true));
        assert!(set.set(TopicRef::new(0, 0), true));
        assert!(set.set(TopicRef::new(0, 0), false));
        assert!(set.is_empty());
    }

    #[test]
    fn summary_counts_per_module() {
        let mut set = CompletedTopics::new();
        set.set(TopicRef::new(0, 1), true);
        set.set(TopicRef::new(1, 0), true);

        let summary = RoadmapProgress::compute(&roadmap(), &set);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.modules[0].completed, 1);
        assert_eq!(summary.modules[1].completed, 1);
        assert_eq!(summary.percent(), 66);
        assert!(!summary.is_complete);

        set.set(TopicRef::new(0, 0), true);
        let summary = RoadmapProgress::compute(&roadmap(), &set);
        assert!(summary.is_complete);
        assert_eq!(summary.percent(), 100);
    }

    #[test]
    fn update_serializes_backend_field_names() {
        let update = ProgressUpdate::new(RoadmapId::new(3), TopicRef::new(1, 2), true);
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "roadmap_id": 3,
                "module_index": 1,
                "topic_index": 2,
                "is_completed": true
            })
        );
    }
}
