//! Data models for Preptrack

mod application;
mod practice_log;
mod record;
mod settings;
mod snapshot;
mod sync_conflict;
mod timestamp;
mod topic;

pub use application::{Application, ApplicationPatch, ApplicationStatus, STALE_AFTER_DAYS};
pub use practice_log::{PracticeLog, PracticeLogPatch};
pub use record::{Collection, Record, RecordId, SoftDelete};
pub use settings::{Settings, SettingsPatch};
pub use snapshot::Snapshot;
pub use sync_conflict::{ConflictResolution, ConflictSide, SyncConflict, UnknownConflictSide};
pub use topic::{Topic, TopicPatch};
