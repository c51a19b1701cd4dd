//! Topic model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Collection, Record, RecordId};
use super::timestamp;

/// A study topic with stats derived from practice logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Device-local identifier; not used as the merge key
    pub id: RecordId,
    pub category: String,
    pub name: String,
    /// Number of non-deleted logs referencing this topic
    #[serde(default)]
    pub practice_count: u32,
    /// Latest log date referencing this topic
    #[serde(default)]
    pub last_practiced: Option<NaiveDate>,
    /// Moved to casual revision; hidden from practice pickers
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// Create a new topic with zeroed stats
    #[must_use]
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            category: category.into(),
            name: name.into(),
            practice_count: 0,
            last_practiced: None,
            completed: false,
            updated_at: None,
        }
    }

    /// Identity used when merging topics across devices
    #[must_use]
    pub fn merge_key(&self) -> String {
        format!("{}::{}", self.category, self.name)
    }
}

/// Fields replaced by a topic edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPatch {
    pub category: Option<String>,
    pub name: Option<String>,
    pub completed: Option<bool>,
}

impl Record for Topic {
    const COLLECTION: Collection = Collection::Topics;
    type Patch = TopicPatch;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn apply_patch(&mut self, patch: TopicPatch, _today: NaiveDate) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_key_combines_category_and_name() {
        let topic = Topic::new("Computer Vision", "SLAM");
        assert_eq!(topic.merge_key(), "Computer Vision::SLAM");
    }

    #[test]
    fn test_deserialize_seeded_topic_without_timestamps() {
        let topic: Topic = serde_json::from_str(
            r#"{"id":"x1","category":"NLP & LLMs","name":"RLHF","practiceCount":2,"lastPracticed":null}"#,
        )
        .unwrap();
        assert_eq!(topic.practice_count, 2);
        assert!(topic.last_practiced.is_none());
        assert!(!topic.completed);
        assert!(topic.updated_at.is_none());
    }
}
