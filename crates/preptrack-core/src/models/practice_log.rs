//! Practice log model

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Collection, Record, RecordId, SoftDelete};
use super::timestamp;

/// One study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeLog {
    /// Unique identifier, assigned at creation and never reassigned
    pub id: RecordId,
    /// Day the session happened
    pub date: NaiveDate,
    /// Minutes spent practicing
    #[serde(default)]
    pub minutes_spent: u32,
    /// Questions answered per resource (e.g. "leetcode" -> 3)
    #[serde(default)]
    pub resources: BTreeMap<String, u32>,
    /// Topics covered during the session
    #[serde(default)]
    pub topics: BTreeSet<RecordId>,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Last modification time, the last-writer-wins clock
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft delete flag for sync
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    /// When the record was soft deleted
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl PracticeLog {
    /// Create a new log for `date`; the id is replaced when the log is added
    #[must_use]
    pub fn new(date: NaiveDate, minutes_spent: u32) -> Self {
        Self {
            id: RecordId::new(),
            date,
            minutes_spent,
            resources: BTreeMap::new(),
            topics: BTreeSet::new(),
            notes: String::new(),
            updated_at: None,
            deleted: false,
            deleted_at: None,
        }
    }

    /// Total questions answered across all resources
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.resources.values().copied().sum()
    }
}

/// Fields replaced by an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeLogPatch {
    pub date: Option<NaiveDate>,
    pub minutes_spent: Option<u32>,
    pub resources: Option<BTreeMap<String, u32>>,
    pub topics: Option<BTreeSet<RecordId>>,
    pub notes: Option<String>,
}

impl Record for PracticeLog {
    const COLLECTION: Collection = Collection::DailyLogs;
    type Patch = PracticeLogPatch;

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

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn apply_patch(&mut self, patch: PracticeLogPatch, _today: NaiveDate) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(minutes_spent) = patch.minutes_spent {
            self.minutes_spent = minutes_spent;
        }
        if let Some(resources) = patch.resources {
            self.resources = resources;
        }
        if let Some(topics) = patch.topics {
            self.topics = topics;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }
}

impl SoftDelete for PracticeLog {
    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = Some(at);
    }
}
