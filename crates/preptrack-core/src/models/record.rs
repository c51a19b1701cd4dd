//! Record identity and the traits shared by every synchronized collection

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque record identifier.
///
/// New ids are UUID v7 strings, but ids created by other devices are kept
/// verbatim whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The four persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    DailyLogs,
    Topics,
    Applications,
    Settings,
}

impl Collection {
    /// Stable local-store key for this collection.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::DailyLogs => "dailyLogs",
            Self::Topics => "topics",
            Self::Applications => "applications",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A record stored as an element of one of the list collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Collection the record lives in
    const COLLECTION: Collection;

    /// Field overwrite applied by `update`
    type Patch;

    fn id(&self) -> &RecordId;

    fn set_id(&mut self, id: RecordId);

    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Tombstones are hidden from `list` but kept in storage
    fn is_deleted(&self) -> bool {
        false
    }

    /// Hook run before a freshly created record is appended
    fn prepare_insert(&mut self) {}

    /// Shallow overwrite of the fields present in `patch`
    fn apply_patch(&mut self, patch: Self::Patch, today: NaiveDate);
}

/// Records that are soft-deleted instead of removed.
pub trait SoftDelete: Record {
    fn mark_deleted(&mut self, at: DateTime<Utc>);
}
