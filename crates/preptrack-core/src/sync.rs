//! Sync orchestration.
//!
//! A [`SyncOrchestrator`] runs one manual sync at a time: read the local
//! snapshot, fetch the remote row, merge, write the merge back locally in one
//! transaction, then push. A failed push leaves the local merge in place; the
//! next sync converges.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::config::SyncMode;
use crate::db::{Database, LocalStore};
use crate::merge::{self, MergeSummary};
use crate::models::{Collection, ConflictResolution, Snapshot};
use crate::remote::{RemoteStore, TransportError};
use crate::repository::{derive_topic_stats, ChangeListener};
use crate::state::SyncStatus;

/// How long `Synced` stays visible before reverting to `Idle`.
pub const SYNCED_DISPLAY_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync is not configured")]
    NotConfigured,
    #[error("A sync is already in progress")]
    AlreadyInProgress,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Local store error: {0}")]
    Local(#[from] crate::Error),
}

impl SyncError {
    fn status(&self) -> SyncStatus {
        match self {
            Self::NotConfigured => SyncStatus::NotConfigured,
            Self::Transport(error) if error.is_offline() => SyncStatus::Offline(error.to_string()),
            other => SyncStatus::Error(other.to_string()),
        }
    }
}

/// What a completed sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Local data changed from the remote side
    pub pulled: bool,
    /// The remote row was written
    pub pushed: bool,
    /// Visible log or application counts changed; views should reload
    pub reload_required: bool,
    pub summary: MergeSummary,
    pub conflicts: usize,
}

/// Pending-changes flag raised by repository writes.
#[derive(Clone, Default)]
pub struct PendingChanges(Arc<AtomicBool>);

impl PendingChanges {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ChangeListener for PendingChanges {
    fn notify_changed(&self, collection: Collection) {
        tracing::trace!("Local change in {collection}");
        self.set();
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Explicit sync instance; one per process.
pub struct SyncOrchestrator<R> {
    db: Arc<Mutex<Database>>,
    remote: Option<R>,
    user_id: Option<String>,
    mode: SyncMode,
    in_flight: AtomicBool,
    pending: PendingChanges,
    status: Arc<watch::Sender<SyncStatus>>,
    generation: Arc<AtomicU64>,
}

impl<R: RemoteStore> SyncOrchestrator<R> {
    /// `remote` is `None` when no remote is configured. `user_id` overrides
    /// the locally generated row key.
    pub fn new(
        db: Arc<Mutex<Database>>,
        remote: Option<R>,
        user_id: Option<String>,
        mode: SyncMode,
    ) -> Self {
        let initial = if remote.is_some() {
            SyncStatus::Idle
        } else {
            SyncStatus::NotConfigured
        };
        let (status, _) = watch::channel(initial);

        Self {
            db,
            remote,
            user_id,
            mode,
            in_flight: AtomicBool::new(false),
            pending: PendingChanges::default(),
            status: Arc::new(status),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub const fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub const fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending.is_set()
    }

    /// Listener to register with the repository
    pub fn pending_changes(&self) -> PendingChanges {
        self.pending.clone()
    }

    fn set_status(&self, status: SyncStatus) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(status);
        generation
    }

    fn schedule_idle_revert(&self, generation: u64) {
        let status = Arc::clone(&self.status);
        let current = Arc::clone(&self.generation);
        tokio::spawn(async move {
            tokio::time::sleep(SYNCED_DISPLAY_DURATION).await;
            if current.load(Ordering::SeqCst) == generation {
                status.send_replace(SyncStatus::Idle);
            }
        });
    }

    /// Run one sync. Rejected while another is in flight.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let Some(remote) = self.remote.as_ref() else {
            self.set_status(SyncStatus::NotConfigured);
            return Err(SyncError::NotConfigured);
        };
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(SyncError::AlreadyInProgress);
        };

        self.set_status(SyncStatus::Syncing);
        let had_pending = self.pending.take();

        let result = match self.mode {
            SyncMode::Merge => self.merge_sync(remote).await,
            SyncMode::LastModified => self.last_modified_sync(remote, had_pending).await,
        };

        match &result {
            Ok(report) => {
                tracing::info!(
                    pulled = report.pulled,
                    pushed = report.pushed,
                    conflicts = report.conflicts,
                    "Sync completed"
                );
                let generation = self.set_status(SyncStatus::Synced);
                self.schedule_idle_revert(generation);
            }
            Err(error) => {
                tracing::warn!("Sync failed: {error}");
                if had_pending {
                    self.pending.set();
                }
                self.set_status(error.status());
            }
        }

        result
    }

    async fn read_local(&self) -> Result<(Snapshot, String), SyncError> {
        let db = self.db.lock().await;
        let store = LocalStore::new(db.connection());
        let snapshot = store.read_snapshot()?;
        let user_id = match &self.user_id {
            Some(user_id) => user_id.clone(),
            None => store.ensure_user_id()?,
        };
        Ok((snapshot, user_id))
    }

    /// Persist a merge. Local writes that landed after `read` are folded in
    /// under the same lock, and topic stats are re-derived before the single
    /// transaction. Returns the snapshot that was stored.
    async fn commit_merge(
        &self,
        read: &Snapshot,
        merged: Snapshot,
        conflicts: &[ConflictResolution],
    ) -> Result<Snapshot, SyncError> {
        let db = self.db.lock().await;
        let store = LocalStore::new(db.connection());

        let current = store.read_snapshot()?;
        let mut merged = if current == *read {
            merged
        } else {
            tracing::debug!("Local data changed while syncing; folding it into the merge");
            merge::merge(&current, &merged).snapshot
        };
        refresh_topic_stats(&mut merged);

        store.replace_snapshot(&merged, conflicts)?;
        Ok(merged)
    }

    async fn merge_sync(&self, remote: &R) -> Result<SyncReport, SyncError> {
        let (local, user_id) = self.read_local().await?;

        let remote_snapshot = remote.fetch_record(&user_id).await?;
        if remote_snapshot.is_none() {
            tracing::info!("No remote snapshot for user {user_id}; uploading local data");
        }
        let remote_snapshot = remote_snapshot.unwrap_or_default();

        let outcome = merge::merge(&local, &remote_snapshot);
        let stored = self
            .commit_merge(&local, outcome.snapshot, &outcome.conflicts)
            .await?;

        remote.upsert_record(&user_id, &stored).await?;

        Ok(SyncReport {
            mode: SyncMode::Merge,
            pulled: outcome.summary.took_remote > 0 || outcome.summary.remote_only > 0,
            pushed: true,
            reload_required: counts_changed(&local, &stored),
            summary: outcome.summary,
            conflicts: outcome.conflicts.len(),
        })
    }

    /// Whole-snapshot sync: the side with the newer `lastModified` replaces
    /// the other. Local writes since the last sync count as newer on a tie.
    async fn last_modified_sync(
        &self,
        remote: &R,
        had_pending: bool,
    ) -> Result<SyncReport, SyncError> {
        let (local, user_id) = self.read_local().await?;
        let remote_snapshot = remote.fetch_record(&user_id).await?;

        let mut report = SyncReport {
            mode: SyncMode::LastModified,
            ..SyncReport::default()
        };

        let upload = {
            let db = self.db.lock().await;
            let store = LocalStore::new(db.connection());
            let mut current = store.read_snapshot()?;
            let written_while_fetching = current != local;

            match remote_snapshot {
                Some(mut remote_snapshot)
                    if !written_while_fetching
                        && remote_snapshot.last_modified > current.last_modified =>
                {
                    refresh_topic_stats(&mut remote_snapshot);
                    store.replace_snapshot(&remote_snapshot, &[])?;
                    report.pulled = true;
                    report.reload_required = counts_changed(&current, &remote_snapshot);
                    None
                }
                Some(remote_snapshot)
                    if !had_pending
                        && !written_while_fetching
                        && current.last_modified <= remote_snapshot.last_modified =>
                {
                    None
                }
                _ => {
                    let now = crate::util::now();
                    current.last_modified = Some(now);
                    store.set_last_modified(now)?;
                    Some(current)
                }
            }
        };

        if let Some(snapshot) = upload {
            remote.upsert_record(&user_id, &snapshot).await?;
            report.pushed = true;
        }

        Ok(report)
    }
}

/// Re-derive topic stats from the snapshot's own logs
fn refresh_topic_stats(snapshot: &mut Snapshot) {
    let changed = derive_topic_stats(
        &snapshot.daily_logs,
        &mut snapshot.topics,
        crate::util::now(),
    );
    if changed > 0 {
        tracing::debug!("Refreshed stats of {changed} topics after sync");
    }
}

fn counts_changed(before: &Snapshot, after: &Snapshot) -> bool {
    before.visible_log_count() != after.visible_log_count()
        || before.visible_application_count() != after.visible_application_count()
}
