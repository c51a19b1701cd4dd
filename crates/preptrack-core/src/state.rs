//! Shared sync state types.

use std::fmt;

/// Sync status surfaced to users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote configured
    NotConfigured,
    /// Ready to sync
    Idle,
    Syncing,
    /// Last sync succeeded; reverts to `Idle` shortly after
    Synced,
    Error(String),
    /// The remote could not be reached
    Offline(String),
}

impl SyncStatus {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not configured",
            Self::Idle => "ready",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error(_) => "error",
            Self::Offline(_) => "offline",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) | Self::Offline(message) => {
                write!(f, "{}: {message}", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}
