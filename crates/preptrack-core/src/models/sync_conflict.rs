//! Sync conflict model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which copy of a record survived a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSide {
    Local,
    Remote,
}

impl ConflictSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// A stored conflict side that is neither `local` nor `remote`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conflict side: {0:?}")]
pub struct UnknownConflictSide(pub String);

impl FromStr for ConflictSide {
    type Err = UnknownConflictSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(UnknownConflictSide(other.to_string())),
        }
    }
}

impl fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded sync conflict resolved during a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict {
    /// Conflict row identifier
    pub id: i64,
    /// Collection the record belongs to
    pub collection: String,
    /// Record id, or `category::name` for topics
    pub record_key: String,
    /// Local copy's timestamp when the conflict occurred
    pub local_updated_at: Option<DateTime<Utc>>,
    /// Remote copy's timestamp
    pub remote_updated_at: Option<DateTime<Utc>>,
    /// Copy kept in the merged snapshot
    pub winner: ConflictSide,
    /// Resolution time
    pub resolved_at: DateTime<Utc>,
}

/// A conflict detected by the merge engine, before it is logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResolution {
    pub collection: super::Collection,
    pub record_key: String,
    pub local_updated_at: Option<DateTime<Utc>>,
    pub remote_updated_at: Option<DateTime<Utc>>,
    pub winner: ConflictSide,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_side_parses_strictly() {
        assert_eq!("local".parse::<ConflictSide>(), Ok(ConflictSide::Local));
        assert_eq!("remote".parse::<ConflictSide>(), Ok(ConflictSide::Remote));
        assert_eq!(
            "Remote".parse::<ConflictSide>(),
            Err(UnknownConflictSide("Remote".to_string()))
        );
        assert!("".parse::<ConflictSide>().is_err());
    }
}
