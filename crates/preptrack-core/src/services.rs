//! Shared tracker service used by the interfaces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::config::{RemoteConfig, SyncMode};
use crate::db::{Database, LocalStore};
use crate::models::{
    Application, ApplicationPatch, PracticeLog, PracticeLogPatch, RecordId, Settings,
    SettingsPatch, Snapshot, SyncConflict, Topic,
};
use crate::remote::{RemoteStore, SupabaseRemote};
use crate::repository::{ApplicationPartition, Repository};
use crate::state::SyncStatus;
use crate::stats::Dashboard;
use crate::sync::{PendingChanges, SyncError, SyncOrchestrator, SyncReport};
use crate::{Error, Result};

/// Thread-safe service over the local store and the sync orchestrator.
#[derive(Clone)]
pub struct TrackerService<R = SupabaseRemote> {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
    pending: PendingChanges,
    sync: Arc<SyncOrchestrator<R>>,
}

impl TrackerService<SupabaseRemote> {
    /// Open the service at `db_path`, wiring up the remote when configured.
    pub fn open_path(db_path: impl Into<PathBuf>, remote: &RemoteConfig) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        let mut service = Self::with_remote(db, Self::remote_from_config(remote)?, remote);
        service.db_path = Some(db_path);
        Ok(service)
    }

    /// Open a local-only in-memory service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_remote(
            Database::open_in_memory()?,
            None,
            &RemoteConfig::default(),
        ))
    }

    fn remote_from_config(remote: &RemoteConfig) -> Result<Option<SupabaseRemote>> {
        if !remote.is_configured() {
            tracing::info!("Running in local-only mode (no remote configured)");
            return Ok(None);
        }

        let endpoint = remote.endpoint().map_err(Error::InvalidInput)?;
        tracing::info!("Sync enabled with Supabase: {}", endpoint.base_url);
        SupabaseRemote::new(endpoint)
            .map(Some)
            .map_err(|error| Error::InvalidInput(error.to_string()))
    }
}

impl<R: RemoteStore> TrackerService<R> {
    /// Build a service over an opened database and an optional remote.
    pub fn with_remote(db: Database, remote: Option<R>, config: &RemoteConfig) -> Self {
        let db = Arc::new(Mutex::new(db));
        let sync = SyncOrchestrator::new(
            Arc::clone(&db),
            remote,
            config.configured_user_id(),
            config.sync_mode,
        );

        Self {
            db,
            db_path: None,
            pending: sync.pending_changes(),
            sync: Arc::new(sync),
        }
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Seed the topic catalog, empty lists and default settings on first run.
    pub async fn seed_defaults(&self) -> Result<bool> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).seed_defaults()
    }

    // Practice logs

    pub async fn list_logs(&self) -> Result<Vec<PracticeLog>> {
        let db = self.db.lock().await;
        let mut logs = Repository::new(db.connection()).list::<PracticeLog>()?;
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }

    pub async fn get_log(&self, id: &RecordId) -> Result<Option<PracticeLog>> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).get(id)
    }

    /// Add a log and refresh topic stats
    pub async fn add_log(&self, log: PracticeLog) -> Result<PracticeLog> {
        let db = self.db.lock().await;
        let repo = Repository::with_listener(db.connection(), &self.pending);
        Self::check_topics_exist(&repo, &log.topics)?;
        let log = repo.add(log)?;
        repo.recompute_topic_stats()?;
        Ok(log)
    }

    pub async fn update_log(
        &self,
        id: &RecordId,
        patch: PracticeLogPatch,
    ) -> Result<Option<PracticeLog>> {
        let db = self.db.lock().await;
        let repo = Repository::with_listener(db.connection(), &self.pending);
        if let Some(topics) = &patch.topics {
            Self::check_topics_exist(&repo, topics)?;
        }
        let updated = repo.update::<PracticeLog>(id, patch)?;
        if updated.is_some() {
            repo.recompute_topic_stats()?;
        }
        Ok(updated)
    }

    pub async fn delete_log(&self, id: &RecordId) -> Result<Option<PracticeLog>> {
        let db = self.db.lock().await;
        let repo = Repository::with_listener(db.connection(), &self.pending);
        let deleted = repo.soft_delete::<PracticeLog>(id)?;
        if deleted.is_some() {
            repo.recompute_topic_stats()?;
        }
        Ok(deleted)
    }

    fn check_topics_exist<'a>(
        repo: &Repository<'_>,
        topics: impl IntoIterator<Item = &'a RecordId>,
    ) -> Result<()> {
        let known = repo.list::<Topic>()?;
        for id in topics {
            if !known.iter().any(|topic| &topic.id == id) {
                return Err(Error::InvalidInput(format!("unknown topic id {id}")));
            }
        }
        Ok(())
    }

    // Topics

    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).list::<Topic>()
    }

    pub async fn set_topic_completed(&self, id: &RecordId, completed: bool) -> Result<Option<Topic>> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).set_topic_completed(id, completed)
    }

    pub async fn recompute_topic_stats(&self) -> Result<Vec<Topic>> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).recompute_topic_stats()
    }

    // Applications

    pub async fn add_application(&self, application: Application) -> Result<Application> {
        if application.company.trim().is_empty() {
            return Err(Error::InvalidInput("company must not be empty".to_string()));
        }
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).add(application)
    }

    pub async fn list_applications(&self, today: NaiveDate) -> Result<ApplicationPartition> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).partition_applications(today)
    }

    /// Every visible application, stale ones included
    pub async fn list_all_applications(&self) -> Result<Vec<Application>> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).list::<Application>()
    }

    pub async fn get_application(&self, id: &RecordId) -> Result<Option<Application>> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).get(id)
    }

    pub async fn update_application(
        &self,
        id: &RecordId,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).update::<Application>(id, patch)
    }

    pub async fn delete_application(&self, id: &RecordId) -> Result<Option<Application>> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).soft_delete::<Application>(id)
    }

    pub async fn sweep_stale_applications(&self, today: NaiveDate) -> Result<Vec<RecordId>> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).sweep_stale_applications(today)
    }

    // Settings

    pub async fn load_settings(&self) -> Result<Settings> {
        let db = self.db.lock().await;
        Repository::new(db.connection()).load_settings()
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let db = self.db.lock().await;
        Repository::with_listener(db.connection(), &self.pending).update_settings(patch)
    }

    // Dashboard and export

    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let db = self.db.lock().await;
        let repo = Repository::new(db.connection());
        Ok(Dashboard::compute(
            &repo.list::<PracticeLog>()?,
            &repo.list::<Topic>()?,
            &repo.list::<Application>()?,
            &repo.load_settings()?,
            today,
        ))
    }

    /// Full local snapshot, tombstones included
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let db = self.db.lock().await;
        LocalStore::new(db.connection()).read_snapshot()
    }

    // Sync

    pub fn is_sync_configured(&self) -> bool {
        self.sync.is_configured()
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync.mode()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.sync.has_pending_changes()
    }

    /// Run a manual sync
    pub async fn sync(&self) -> std::result::Result<SyncReport, SyncError> {
        self.sync.sync().await
    }

    /// Row key used on the remote: configured or generated locally
    pub async fn user_id(&self, configured: Option<String>) -> Result<String> {
        if let Some(user_id) = configured {
            return Ok(user_id);
        }
        let db = self.db.lock().await;
        LocalStore::new(db.connection()).ensure_user_id()
    }

    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        let db = self.db.lock().await;
        LocalStore::new(db.connection()).last_modified()
    }

    /// List recently resolved sync conflicts.
    pub async fn list_conflicts(&self, limit: usize) -> Result<Vec<SyncConflict>> {
        let db = self.db.lock().await;
        LocalStore::new(db.connection()).list_conflicts(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use crate::util;
    use pretty_assertions::assert_eq;

    fn memory_service(remote: &Arc<MemoryRemote>) -> TrackerService<Arc<MemoryRemote>> {
        let config = RemoteConfig {
            user_id: Some("shared".to_string()),
            ..RemoteConfig::default()
        };
        TrackerService::with_remote(
            Database::open_in_memory().unwrap(),
            Some(Arc::clone(remote)),
            &config,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_seed_and_log_roundtrip() {
        let service = TrackerService::open_in_memory().unwrap();
        assert!(service.seed_defaults().await.unwrap());
        assert!(!service.is_sync_configured());
        assert_eq!(service.sync_status(), SyncStatus::NotConfigured);

        let topic = service.list_topics().await.unwrap().remove(0);
        let mut draft = PracticeLog::new(util::today(), 25);
        draft.topics.insert(topic.id.clone());
        let log = service.add_log(draft).await.unwrap();

        assert_eq!(service.list_logs().await.unwrap(), vec![log.clone()]);
        let topics = service.list_topics().await.unwrap();
        let refreshed = topics.iter().find(|t| t.id == topic.id).unwrap();
        assert_eq!(refreshed.practice_count, 1);
        assert_eq!(refreshed.last_practiced, Some(util::today()));

        service.delete_log(&log.id).await.unwrap().unwrap();
        let topics = service.list_topics().await.unwrap();
        let refreshed = topics.iter().find(|t| t.id == topic.id).unwrap();
        assert_eq!(refreshed.practice_count, 0);
    }

    #[tokio::test]
    async fn add_log_rejects_unknown_topics() {
        let service = TrackerService::open_in_memory().unwrap();
        let mut draft = PracticeLog::new(util::today(), 25);
        draft.topics.insert(RecordId::from("nope"));
        assert!(matches!(
            service.add_log(draft).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn writes_mark_pending_until_synced() {
        let remote = Arc::new(MemoryRemote::default());
        let service = memory_service(&remote);
        assert!(!service.has_pending_changes());

        service
            .add_application(Application::new("Acme", "MLE", util::today()))
            .await
            .unwrap();
        assert!(service.has_pending_changes());

        service.sync().await.unwrap();
        assert!(!service.has_pending_changes());
        assert_eq!(remote.row("shared").unwrap().applications.len(), 1);
    }

    #[tokio::test]
    async fn open_path_with_configured_remote() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..RemoteConfig::default()
        };
        let service = TrackerService::open_path(dir.path().join("nested/prep.db"), &config).unwrap();
        assert!(service.is_sync_configured());
        assert_eq!(service.sync_status(), SyncStatus::Idle);
        assert!(service.db_path().unwrap().exists());
    }

    #[tokio::test]
    async fn open_path_rejects_invalid_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig {
            supabase_url: Some("demo.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..RemoteConfig::default()
        };
        assert!(matches!(
            TrackerService::open_path(dir.path().join("prep.db"), &config),
            Err(Error::InvalidInput(_))
        ));
    }
}
