//! Pure snapshot merge.
//!
//! Logs and applications merge by `id` with last-writer-wins on `updatedAt`.
//! Topics merge by `category::name`, preferring the copy with the higher
//! `practiceCount`. Settings are a shallow union where local keys win.
//! Tombstones are ordinary records here, so a newer deletion beats an older
//! edit on the other side.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::models::{
    Application, Collection, ConflictResolution, ConflictSide, PracticeLog, Record, Settings,
    Snapshot, Topic,
};

/// Tally of where the merged records came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Present only locally
    pub local_only: usize,
    /// Present only remotely
    pub remote_only: usize,
    /// Present on both sides, local copy kept
    pub kept_local: usize,
    /// Present on both sides, remote copy taken
    pub took_remote: usize,
}

/// Result of merging two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub snapshot: Snapshot,
    /// Records that differed on both sides, with the side that won
    pub conflicts: Vec<ConflictResolution>,
    pub summary: MergeSummary,
}

#[derive(Default)]
struct MergeLog {
    conflicts: Vec<ConflictResolution>,
    summary: MergeSummary,
}

/// Merge two lists of id-keyed records.
///
/// Local order is preserved and remote-only records follow in remote order.
pub fn merge_by_id<R: Record + PartialEq>(local: &[R], remote: &[R]) -> Vec<R> {
    merge_keyed(
        local,
        remote,
        R::COLLECTION,
        |record: &R| record.id().to_string(),
        remote_is_newer,
        &mut MergeLog::default(),
    )
}

/// Merge two topic lists keyed by `category::name`.
pub fn merge_topics_by_name(local: &[Topic], remote: &[Topic]) -> Vec<Topic> {
    merge_keyed(
        local,
        remote,
        Collection::Topics,
        Topic::merge_key,
        remote_topic_wins,
        &mut MergeLog::default(),
    )
}

/// Shallow union of settings; local values win on collisions.
pub fn merge_settings(local: &Settings, remote: &Settings) -> Settings {
    local.union_preferring_self(remote)
}

/// Merge two snapshots, stamping `lastModified` with the current time.
pub fn merge(local: &Snapshot, remote: &Snapshot) -> MergeOutcome {
    merge_at(local, remote, crate::util::now())
}

/// Merge two snapshots with an explicit clock.
pub fn merge_at(local: &Snapshot, remote: &Snapshot, now: DateTime<Utc>) -> MergeOutcome {
    let mut log = MergeLog::default();

    let daily_logs = merge_keyed(
        &local.daily_logs,
        &remote.daily_logs,
        Collection::DailyLogs,
        |entry: &PracticeLog| entry.id.to_string(),
        remote_is_newer,
        &mut log,
    );
    let topics = merge_keyed(
        &local.topics,
        &remote.topics,
        Collection::Topics,
        Topic::merge_key,
        remote_topic_wins,
        &mut log,
    );
    let applications = merge_keyed(
        &local.applications,
        &remote.applications,
        Collection::Applications,
        |entry: &Application| entry.id.to_string(),
        remote_is_newer,
        &mut log,
    );
    let settings = merge_settings(&local.settings, &remote.settings);

    let summary = log.summary;
    tracing::debug!(
        local_only = summary.local_only,
        remote_only = summary.remote_only,
        kept_local = summary.kept_local,
        took_remote = summary.took_remote,
        conflicts = log.conflicts.len(),
        "Merged snapshots"
    );

    MergeOutcome {
        snapshot: Snapshot {
            daily_logs,
            topics,
            applications,
            settings,
            last_modified: Some(now),
        },
        conflicts: log.conflicts,
        summary,
    }
}

fn remote_is_newer<R: Record>(local: &R, remote: &R) -> bool {
    // `None` orders before any timestamp
    remote.updated_at() > local.updated_at()
}

fn remote_topic_wins(local: &Topic, remote: &Topic) -> bool {
    match remote.practice_count.cmp(&local.practice_count) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => remote.updated_at > local.updated_at,
    }
}

fn merge_keyed<R, K, W>(
    local: &[R],
    remote: &[R],
    collection: Collection,
    key_of: K,
    remote_wins: W,
    log: &mut MergeLog,
) -> Vec<R>
where
    R: Record + PartialEq,
    K: Fn(&R) -> String,
    W: Fn(&R, &R) -> bool,
{
    let local_by_key = winners_by_key(local, &key_of, &remote_wins);
    let remote_by_key = winners_by_key(remote, &key_of, &remote_wins);

    let mut emitted = HashSet::with_capacity(local.len() + remote.len());
    let mut merged = Vec::with_capacity(local.len() + remote.len());

    for local_record in local {
        let key = key_of(local_record);
        if emitted.contains(&key) {
            continue;
        }
        let local_record = local_by_key.get(&key).copied().unwrap_or(local_record);

        match remote_by_key.get(&key) {
            None => {
                log.summary.local_only += 1;
                merged.push(local_record.clone());
            }
            Some(&remote_record) => {
                let take_remote = remote_wins(local_record, remote_record);
                if take_remote {
                    log.summary.took_remote += 1;
                } else {
                    log.summary.kept_local += 1;
                }

                if local_record != remote_record {
                    log.conflicts.push(ConflictResolution {
                        collection,
                        record_key: key.clone(),
                        local_updated_at: local_record.updated_at(),
                        remote_updated_at: remote_record.updated_at(),
                        winner: if take_remote {
                            ConflictSide::Remote
                        } else {
                            ConflictSide::Local
                        },
                    });
                }

                merged.push(if take_remote {
                    remote_record.clone()
                } else {
                    local_record.clone()
                });
            }
        }
        emitted.insert(key);
    }

    for remote_record in remote {
        let key = key_of(remote_record);
        if emitted.contains(&key) {
            continue;
        }
        let remote_record = remote_by_key.get(&key).copied().unwrap_or(remote_record);
        log.summary.remote_only += 1;
        merged.push(remote_record.clone());
        emitted.insert(key);
    }

    merged
}

/// Collapse one side's duplicate keys with the same rule used across sides:
/// a later copy replaces an earlier one only when it would win.
fn winners_by_key<'r, R, K, W>(
    records: &'r [R],
    key_of: &K,
    wins: &W,
) -> HashMap<String, &'r R>
where
    K: Fn(&R) -> String,
    W: Fn(&R, &R) -> bool,
{
    let mut by_key: HashMap<String, &R> = HashMap::with_capacity(records.len());
    for record in records {
        match by_key.entry(key_of(record)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if wins(slot.get(), record) {
                    slot.insert(record);
                }
            }
        }
    }
    by_key
}
