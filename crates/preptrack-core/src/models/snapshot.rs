//! Snapshot: the unit of merge and transport

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Record;
use super::{Application, PracticeLog, Settings, Topic};
use super::timestamp;

/// Every synchronized collection plus the snapshot-level timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub daily_logs: Vec<PracticeLog>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, with = "timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Number of logs that are not tombstones
    #[must_use]
    pub fn visible_log_count(&self) -> usize {
        self.daily_logs.iter().filter(|log| !log.is_deleted()).count()
    }

    /// Number of applications that are not tombstones
    #[must_use]
    pub fn visible_application_count(&self) -> usize {
        self.applications
            .iter()
            .filter(|application| !application.is_deleted())
            .count()
    }

    /// Parse a snapshot received from storage or the network
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Parse a snapshot from an already-decoded JSON value
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_empty_snapshot() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_rejects_non_object_payload() {
        assert!(Snapshot::from_json("[1, 2, 3]").is_err());
        assert!(Snapshot::from_json(r#"{"dailyLogs": "nope"}"#).is_err());
    }

    #[test]
    fn test_visible_counts_skip_tombstones() {
        let snapshot = Snapshot::from_json(
            r#"{
                "dailyLogs": [
                    {"id": "a", "date": "2024-01-01"},
                    {"id": "b", "date": "2024-01-02", "deleted": true}
                ],
                "applications": [
                    {"id": "c", "company": "Acme", "dateApplied": "2024-01-01", "status": "Applied", "deleted": true}
                ],
                "lastModified": "2024-01-03T00:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.visible_log_count(), 1);
        assert_eq!(snapshot.visible_application_count(), 0);
        assert!(snapshot.last_modified.is_some());
    }
}
