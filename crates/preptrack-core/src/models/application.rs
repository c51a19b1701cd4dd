//! Job application model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Collection, Record, RecordId, SoftDelete};
use super::timestamp;
use crate::util::days_between;

/// Applications untouched for this many days are swept to `Stale`.
pub const STALE_AFTER_DAYS: i64 = 14;

/// Pipeline stage of an application.
///
/// Unknown stages written by other clients are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    Applied,
    PhoneScreen,
    TechnicalInterview,
    Onsite,
    Offer,
    Rejected,
    Stale,
    Other(String),
}

impl ApplicationStatus {
    /// Display label, identical to the stored value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Applied => "Applied",
            Self::PhoneScreen => "Phone Screen",
            Self::TechnicalInterview => "Technical Interview",
            Self::Onsite => "Onsite",
            Self::Offer => "Offer",
            Self::Rejected => "Rejected",
            Self::Stale => "Stale",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for ApplicationStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "applied" => Self::Applied,
            "phone screen" | "phone-screen" => Self::PhoneScreen,
            "technical interview" | "technical-interview" => Self::TechnicalInterview,
            "onsite" => Self::Onsite,
            "offer" => Self::Offer,
            "rejected" => Self::Rejected,
            "stale" => Self::Stale,
            _ => Self::Other(value),
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(value: ApplicationStatus) -> Self {
        match value {
            ApplicationStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: RecordId,
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    pub date_applied: NaiveDate,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
    /// Last user edit (calendar day); the stale sweep never moves it
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft delete flag for sync
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Application {
    /// Create a new application in the `Applied` stage
    #[must_use]
    pub fn new(company: impl Into<String>, title: impl Into<String>, date_applied: NaiveDate) -> Self {
        Self {
            id: RecordId::new(),
            company: company.into(),
            title: title.into(),
            link: String::new(),
            date_applied,
            status: ApplicationStatus::Applied,
            notes: String::new(),
            last_updated: None,
            updated_at: None,
            deleted: false,
            deleted_at: None,
        }
    }

    /// Day of the last user edit, falling back to the application date
    #[must_use]
    pub fn last_touched(&self) -> NaiveDate {
        self.last_updated.unwrap_or(self.date_applied)
    }

    /// Whether the application should be shown in the stale section
    #[must_use]
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.status == ApplicationStatus::Stale
            || days_between(self.last_touched(), today) >= STALE_AFTER_DAYS
    }
}

/// Fields replaced by an application edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub company: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub date_applied: Option<NaiveDate>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
}

impl Record for Application {
    const COLLECTION: Collection = Collection::Applications;
    type Patch = ApplicationPatch;

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

    fn prepare_insert(&mut self) {
        self.last_updated = Some(self.date_applied);
    }

    fn apply_patch(&mut self, patch: ApplicationPatch, today: NaiveDate) {
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(link) = patch.link {
            self.link = link;
        }
        if let Some(date_applied) = patch.date_applied {
            self.date_applied = date_applied;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.last_updated = Some(today);
    }
}

impl SoftDelete for Application {
    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_round_trips_known_and_unknown_values() {
        let known: ApplicationStatus = serde_json::from_str("\"Phone Screen\"").unwrap();
        assert_eq!(known, ApplicationStatus::PhoneScreen);
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"Phone Screen\"");

        let unknown: ApplicationStatus = serde_json::from_str("\"Ghosted\"").unwrap();
        assert_eq!(unknown, ApplicationStatus::Other("Ghosted".to_string()));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"Ghosted\"");
    }

    #[test]
    fn test_is_stale_after_fourteen_days() {
        let mut app = Application::new("Acme", "ML Engineer", date(2024, 1, 1));
        app.last_updated = Some(date(2024, 1, 1));
        assert!(!app.is_stale(date(2024, 1, 14)));
        assert!(app.is_stale(date(2024, 1, 15)));
    }

    #[test]
    fn test_is_stale_when_status_already_stale() {
        let mut app = Application::new("Acme", "ML Engineer", date(2024, 1, 1));
        app.status = ApplicationStatus::Stale;
        assert!(app.is_stale(date(2024, 1, 2)));
    }

    #[test]
    fn test_apply_patch_refreshes_last_updated() {
        let mut app = Application::new("Acme", "ML Engineer", date(2024, 1, 1));
        app.prepare_insert();
        assert_eq!(app.last_updated, Some(date(2024, 1, 1)));

        app.apply_patch(
            ApplicationPatch {
                status: Some(ApplicationStatus::Onsite),
                ..ApplicationPatch::default()
            },
            date(2024, 2, 1),
        );
        assert_eq!(app.status, ApplicationStatus::Onsite);
        assert_eq!(app.last_updated, Some(date(2024, 2, 1)));
        assert_eq!(app.company, "Acme");
    }
}
