//! Entity repository over the local store.
//!
//! Every successful write notifies the registered [`ChangeListener`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;

use crate::catalog;
use crate::db::LocalStore;
use crate::error::Result;
use crate::models::{
    Application, ApplicationStatus, Collection, PracticeLog, Record, RecordId, Settings,
    SettingsPatch, SoftDelete, Topic, TopicPatch,
};
use crate::util;

/// Observer called after each successful local write.
pub trait ChangeListener: Send + Sync {
    fn notify_changed(&self, collection: Collection);
}

impl<F> ChangeListener for F
where
    F: Fn(Collection) + Send + Sync,
{
    fn notify_changed(&self, collection: Collection) {
        self(collection);
    }
}

/// Applications split for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPartition {
    pub active: Vec<Application>,
    /// Untouched for too long; status shown as `Stale`
    pub stale: Vec<Application>,
}

/// CRUD over the four collections of one local store.
pub struct Repository<'a> {
    store: LocalStore<'a>,
    listener: Option<&'a dyn ChangeListener>,
}

impl<'a> Repository<'a> {
    /// Create a repository with no change listener
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            store: LocalStore::new(conn),
            listener: None,
        }
    }

    /// Create a repository that reports writes to `listener`
    pub const fn with_listener(conn: &'a Connection, listener: &'a dyn ChangeListener) -> Self {
        Self {
            store: LocalStore::new(conn),
            listener: Some(listener),
        }
    }

    fn notify(&self, collection: Collection) {
        if let Some(listener) = self.listener {
            listener.notify_changed(collection);
        }
    }

    /// Stamp `lastModified` and tell the listener
    fn mark_changed(&self, collection: Collection) -> Result<()> {
        self.store.set_last_modified(util::now())?;
        self.notify(collection);
        Ok(())
    }

    fn persist<R: Record>(&self, records: &[R]) -> Result<()> {
        self.store.save_list(records)?;
        self.mark_changed(R::COLLECTION)
    }

    /// Visible records; tombstones are filtered out
    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        Ok(self
            .list_all::<R>()?
            .into_iter()
            .filter(|record| !record.is_deleted())
            .collect())
    }

    /// Every stored record, tombstones included
    pub fn list_all<R: Record>(&self) -> Result<Vec<R>> {
        Ok(self.store.load_list()?.unwrap_or_default())
    }

    /// A single record by id, tombstones included
    pub fn get<R: Record>(&self, id: &RecordId) -> Result<Option<R>> {
        Ok(self
            .list_all::<R>()?
            .into_iter()
            .find(|record| record.id() == id))
    }

    /// Append a new record under a fresh id
    pub fn add<R: Record>(&self, mut record: R) -> Result<R> {
        record.set_id(RecordId::new());
        record.set_updated_at(util::now());
        record.prepare_insert();

        let mut records = self.list_all::<R>()?;
        records.push(record.clone());
        self.persist(&records)?;

        tracing::debug!("Added {} record {}", R::COLLECTION, record.id());
        Ok(record)
    }

    /// Overwrite the patched fields of an existing record
    pub fn update<R: Record>(&self, id: &RecordId, patch: R::Patch) -> Result<Option<R>> {
        let mut records = self.list_all::<R>()?;
        let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };

        record.apply_patch(patch, util::today());
        record.set_updated_at(util::now());
        let updated = record.clone();

        self.persist(&records)?;
        Ok(Some(updated))
    }

    /// Turn a record into a tombstone; it stays in storage for sync
    pub fn soft_delete<R: SoftDelete>(&self, id: &RecordId) -> Result<Option<R>> {
        let mut records = self.list_all::<R>()?;
        let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };

        record.mark_deleted(util::now());
        let deleted = record.clone();

        self.persist(&records)?;
        tracing::debug!("Soft deleted {} record {id}", R::COLLECTION);
        Ok(Some(deleted))
    }

    /// Rebuild every topic's practice count and last-practiced date from the
    /// visible logs. Only topics whose stats changed are re-stamped.
    pub fn recompute_topic_stats(&self) -> Result<Vec<Topic>> {
        let logs = self.list::<PracticeLog>()?;
        let mut topics = self.list_all::<Topic>()?;

        let changed = derive_topic_stats(&logs, &mut topics, util::now());
        if changed > 0 {
            self.persist(&topics)?;
        }
        tracing::debug!("Recomputed topic stats, {changed} topics changed");
        Ok(topics)
    }

    /// Move a topic in or out of casual revision
    pub fn set_topic_completed(&self, id: &RecordId, completed: bool) -> Result<Option<Topic>> {
        self.update::<Topic>(
            id,
            TopicPatch {
                completed: Some(completed),
                ..TopicPatch::default()
            },
        )
    }

    /// Mark applications untouched for too long as `Stale`.
    ///
    /// `lastUpdated` is left alone; `updatedAt` is re-stamped so the status
    /// change reaches other devices. Returns the ids that transitioned.
    pub fn sweep_stale_applications(&self, today: NaiveDate) -> Result<Vec<RecordId>> {
        let mut applications = self.list_all::<Application>()?;
        let now = util::now();

        let mut swept = Vec::new();
        for application in &mut applications {
            if application.deleted
                || application.status == ApplicationStatus::Stale
                || !application.is_stale(today)
            {
                continue;
            }
            application.status = ApplicationStatus::Stale;
            application.updated_at = Some(now);
            swept.push(application.id.clone());
        }

        if !swept.is_empty() {
            self.persist(&applications)?;
            tracing::info!("Marked {} applications as stale", swept.len());
        }
        Ok(swept)
    }

    /// Split visible applications into active and stale for display
    pub fn partition_applications(&self, today: NaiveDate) -> Result<ApplicationPartition> {
        let mut partition = ApplicationPartition::default();
        for mut application in self.list::<Application>()? {
            if application.is_stale(today) {
                application.status = ApplicationStatus::Stale;
                partition.stale.push(application);
            } else {
                partition.active.push(application);
            }
        }
        Ok(partition)
    }

    /// Current settings, defaults when never written
    pub fn load_settings(&self) -> Result<Settings> {
        Ok(self.store.load_settings()?.unwrap_or_else(Settings::initial))
    }

    /// Shallow union of `patch` onto the current settings
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let mut settings = self.load_settings()?;
        for (key, value) in patch {
            settings.set(key, value);
        }
        self.store.save_settings(&settings)?;
        self.mark_changed(Collection::Settings)?;
        Ok(settings)
    }

    /// First-run initialization. Returns whether anything was written.
    pub fn seed_defaults(&self) -> Result<bool> {
        let mut seeded = false;

        let topics_missing = self
            .store
            .load_list::<Topic>()?
            .as_ref()
            .map_or(true, Vec::is_empty);
        if topics_missing {
            let topics = catalog::default_topics();
            tracing::info!("Seeding {} default topics", topics.len());
            self.store.save_list(&topics)?;
            seeded = true;
        }

        if self.store.load_list::<PracticeLog>()?.is_none() {
            self.store.save_list::<PracticeLog>(&[])?;
            seeded = true;
        }

        if self.store.load_list::<Application>()?.is_none() {
            self.store.save_list::<Application>(&[])?;
            seeded = true;
        }

        if self.store.load_settings()?.is_none() {
            self.store.save_settings(&Settings::initial())?;
            seeded = true;
        }

        Ok(seeded)
    }
}

/// Rebuild practice counts and last-practiced dates of `topics` from the
/// visible entries of `logs`. Topics whose stats changed get `updatedAt = now`;
/// returns how many changed.
pub fn derive_topic_stats(
    logs: &[PracticeLog],
    topics: &mut [Topic],
    now: DateTime<Utc>,
) -> usize {
    let mut stats: HashMap<&RecordId, (u32, Option<NaiveDate>)> = HashMap::new();
    for log in logs.iter().filter(|log| !log.is_deleted()) {
        for topic_id in &log.topics {
            let entry = stats.entry(topic_id).or_insert((0, None));
            entry.0 += 1;
            entry.1 = entry.1.max(Some(log.date));
        }
    }

    let mut changed = 0usize;
    for topic in topics {
        let (count, last) = stats.get(&topic.id).copied().unwrap_or((0, None));
        if topic.practice_count != count || topic.last_practiced != last {
            topic.practice_count = count;
            topic.last_practiced = last;
            topic.updated_at = Some(now);
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{ApplicationPatch, PracticeLogPatch};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let db = setup();
        let repo = Repository::new(db.connection());

        let draft = PracticeLog::new(date(2024, 3, 1), 45);
        let draft_id = draft.id.clone();
        let log = repo.add(draft).unwrap();

        assert_ne!(log.id, draft_id);
        assert!(log.updated_at.is_some());
        let fetched = repo.get::<PracticeLog>(&log.id).unwrap().unwrap();
        assert_eq!(fetched, log);
    }

    #[test]
    fn test_get_unknown_id_is_none() {
        let db = setup();
        let repo = Repository::new(db.connection());
        let missing = RecordId::from("missing");

        assert!(repo.get::<PracticeLog>(&missing).unwrap().is_none());
        assert!(repo
            .update::<PracticeLog>(&missing, PracticeLogPatch::default())
            .unwrap()
            .is_none());
        assert!(repo.soft_delete::<PracticeLog>(&missing).unwrap().is_none());
    }

    #[test]
    fn test_update_overwrites_patched_fields_only() {
        let db = setup();
        let repo = Repository::new(db.connection());

        let mut draft = PracticeLog::new(date(2024, 3, 1), 30);
        draft.notes = "graphs".to_string();
        let log = repo.add(draft).unwrap();

        let updated = repo
            .update::<PracticeLog>(
                &log.id,
                PracticeLogPatch {
                    minutes_spent: Some(45),
                    ..PracticeLogPatch::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.minutes_spent, 45);
        assert_eq!(updated.notes, "graphs");
        assert!(updated.updated_at >= log.updated_at);
    }

    #[test]
    fn test_soft_delete_hides_from_list_but_keeps_tombstone() {
        let db = setup();
        let repo = Repository::new(db.connection());

        let keep = repo.add(PracticeLog::new(date(2024, 3, 1), 30)).unwrap();
        let gone = repo.add(PracticeLog::new(date(2024, 3, 2), 20)).unwrap();

        let tombstone = repo.soft_delete::<PracticeLog>(&gone.id).unwrap().unwrap();
        assert!(tombstone.deleted);
        assert!(tombstone.deleted_at.is_some());

        let visible = repo.list::<PracticeLog>().unwrap();
        assert_eq!(visible, vec![keep]);

        let all = repo.list_all::<PracticeLog>().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|log| log.id == gone.id && log.deleted));
    }

    #[test]
    fn test_listener_is_notified_on_writes() {
        let db = setup();
        let seen = Mutex::new(Vec::new());
        let listener = |collection: Collection| seen.lock().unwrap().push(collection);
        let repo = Repository::with_listener(db.connection(), &listener);

        let log = repo.add(PracticeLog::new(date(2024, 3, 1), 30)).unwrap();
        repo.soft_delete::<PracticeLog>(&log.id).unwrap();
        repo.update_settings(SettingsPatch::from([("dailyGoalMinutes".to_string(), json!(40))]))
            .unwrap();
        repo.list::<PracticeLog>().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Collection::DailyLogs,
                Collection::DailyLogs,
                Collection::Settings
            ]
        );
    }

    #[test]
    fn test_recompute_topic_stats_ignores_deleted_logs() {
        let db = setup();
        let repo = Repository::new(db.connection());

        let slam = repo.add(Topic::new("Computer Vision", "SLAM")).unwrap();
        let pca = repo.add(Topic::new("ML Algorithms & Neural Networks", "PCA")).unwrap();

        let mut first = PracticeLog::new(date(2024, 3, 1), 30);
        first.topics.insert(slam.id.clone());
        repo.add(first).unwrap();

        let mut second = PracticeLog::new(date(2024, 3, 5), 30);
        second.topics.insert(slam.id.clone());
        second.topics.insert(pca.id.clone());
        let second = repo.add(second).unwrap();

        let mut third = PracticeLog::new(date(2024, 3, 9), 30);
        third.topics.insert(pca.id.clone());
        let third = repo.add(third).unwrap();
        repo.soft_delete::<PracticeLog>(&third.id).unwrap();

        let topics = repo.recompute_topic_stats().unwrap();
        let slam = topics.iter().find(|topic| topic.id == slam.id).unwrap();
        let pca = topics.iter().find(|topic| topic.id == pca.id).unwrap();

        assert_eq!(slam.practice_count, 2);
        assert_eq!(slam.last_practiced, Some(second.date));
        assert_eq!(pca.practice_count, 1);
        assert_eq!(pca.last_practiced, Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_set_topic_completed_keeps_topic_listed() {
        let db = setup();
        let repo = Repository::new(db.connection());
        let topic = repo.add(Topic::new("Computer Vision", "SLAM")).unwrap();

        let done = repo.set_topic_completed(&topic.id, true).unwrap().unwrap();
        assert!(done.completed);
        assert_eq!(repo.list::<Topic>().unwrap().len(), 1);
    }

    #[test]
    fn test_stale_sweep_marks_status_without_touching_last_updated() {
        let db = setup();
        let repo = Repository::new(db.connection());
        let today = date(2024, 5, 21);

        let application = repo
            .add(Application::new("Acme", "ML Engineer", today - Duration::days(20)))
            .unwrap();
        let fresh = repo
            .add(Application::new("Initech", "Data Scientist", today - Duration::days(3)))
            .unwrap();

        let swept = repo.sweep_stale_applications(today).unwrap();
        assert_eq!(swept, vec![application.id.clone()]);

        let stored = repo.get::<Application>(&application.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Stale);
        assert_eq!(stored.last_updated, application.last_updated);
        assert_eq!(stored.last_updated, Some(today - Duration::days(20)));

        let partition = repo.partition_applications(today).unwrap();
        assert_eq!(partition.active.len(), 1);
        assert_eq!(partition.active[0].id, fresh.id);
        assert_eq!(partition.stale.len(), 1);
        assert_eq!(partition.stale[0].status, ApplicationStatus::Stale);

        assert!(repo.sweep_stale_applications(today).unwrap().is_empty());
    }

    #[test]
    fn test_application_edit_refreshes_last_updated() {
        let db = setup();
        let repo = Repository::new(db.connection());
        let application = repo
            .add(Application::new("Acme", "ML Engineer", date(2020, 1, 1)))
            .unwrap();

        let updated = repo
            .update::<Application>(
                &application.id,
                ApplicationPatch {
                    status: Some(ApplicationStatus::PhoneScreen),
                    ..ApplicationPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.last_updated, Some(util::today()));
    }

    #[test]
    fn test_seed_defaults_runs_once() {
        let db = setup();
        let repo = Repository::new(db.connection());

        assert!(repo.seed_defaults().unwrap());
        assert_eq!(
            repo.list::<Topic>().unwrap().len(),
            catalog::default_topics().len()
        );
        assert!(repo.list::<PracticeLog>().unwrap().is_empty());
        assert_eq!(repo.load_settings().unwrap(), Settings::initial());

        assert!(!repo.seed_defaults().unwrap());
    }

    #[test]
    fn test_writes_advance_last_modified_but_seeding_does_not() {
        let db = setup();
        let repo = Repository::new(db.connection());
        let store = LocalStore::new(db.connection());

        repo.seed_defaults().unwrap();
        assert!(store.last_modified().unwrap().is_none());

        repo.add(PracticeLog::new(date(2024, 3, 1), 20)).unwrap();
        let after_add = store.last_modified().unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        repo.update_settings(SettingsPatch::from([("dailyGoalMinutes".to_string(), json!(45))]))
            .unwrap();
        assert!(store.last_modified().unwrap().unwrap() > after_add);
    }

    #[test]
    fn test_derive_topic_stats_only_restamps_changed_topics() {
        let now = util::now();
        let mut busy = Topic::new("Computer Vision", "SLAM");
        busy.practice_count = 5;
        let idle = Topic::new("Computer Vision", "Optical Flow");

        let mut log = PracticeLog::new(date(2024, 3, 2), 30);
        log.topics = std::collections::BTreeSet::from([busy.id.clone()]);
        let mut deleted = PracticeLog::new(date(2024, 3, 3), 30);
        deleted.topics = std::collections::BTreeSet::from([busy.id.clone()]);
        deleted.mark_deleted(now);

        let mut topics = vec![busy, idle];
        let changed = derive_topic_stats(&[log, deleted], &mut topics, now);

        assert_eq!(changed, 1);
        assert_eq!(topics[0].practice_count, 1);
        assert_eq!(topics[0].last_practiced, Some(date(2024, 3, 2)));
        assert_eq!(topics[0].updated_at, Some(now));
        assert_eq!(topics[1].updated_at, None);
    }

    #[test]
    fn test_seed_defaults_keeps_existing_settings() {
        let db = setup();
        let repo = Repository::new(db.connection());
        repo.update_settings(SettingsPatch::from([("targetDate".to_string(), json!("2024-09-01"))]))
            .unwrap();

        repo.seed_defaults().unwrap();
        let settings = repo.load_settings().unwrap();
        assert_eq!(settings.target_date(), Some(date(2024, 9, 1)));
        assert_eq!(settings.daily_goal_minutes(), 30);
    }
}
