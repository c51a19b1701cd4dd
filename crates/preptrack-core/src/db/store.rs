//! Key-value access to the persisted collections

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{
    Collection, ConflictResolution, ConflictSide, Record, RecordId, Settings, Snapshot,
    SyncConflict,
};

/// Key holding the snapshot-level modification time
pub const LAST_MODIFIED_KEY: &str = "lastModified";
/// Key holding the locally generated remote row identifier
pub const USER_ID_KEY: &str = "userId";

/// Whole-collection JSON blobs stored under stable keys.
///
/// A missing key means "uninitialized" and is reported as `None`, distinct
/// from a present-but-empty collection.
pub struct LocalStore<'a> {
    conn: &'a Connection,
}

impl<'a> LocalStore<'a> {
    /// Create a store over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Raw JSON stored under `key`
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_raw_on(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Overwrite the JSON stored under `key`
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        Self::set_raw_on(self.conn, key, value)
    }

    /// Delete `key`, returning the store to "uninitialized" for it
    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_raw(key)?
            .map(|raw| serde_json::from_str::<T>(&raw).map_err(crate::Error::from))
            .transpose()
    }

    fn set_json_on<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        Self::set_raw_on(conn, key, &raw)
    }

    /// Every stored record of a list collection, tombstones included
    pub fn load_list<R: Record>(&self) -> Result<Option<Vec<R>>> {
        self.get_json(R::COLLECTION.storage_key())
    }

    /// Replace a list collection
    pub fn save_list<R: Record>(&self, records: &[R]) -> Result<()> {
        Self::set_json_on(self.conn, R::COLLECTION.storage_key(), records)
    }

    pub fn load_settings(&self) -> Result<Option<Settings>> {
        self.get_json(Collection::Settings.storage_key())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        Self::set_json_on(self.conn, Collection::Settings.storage_key(), settings)
    }

    /// Snapshot-level modification time, if any sync has stamped one
    pub fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.get_json(LAST_MODIFIED_KEY)
    }

    /// Stamp the snapshot-level modification time
    pub fn set_last_modified(&self, at: DateTime<Utc>) -> Result<()> {
        Self::set_json_on(self.conn, LAST_MODIFIED_KEY, &at)
    }

    /// Read the whole dataset; uninitialized collections read as empty
    pub fn read_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            daily_logs: self.load_list()?.unwrap_or_default(),
            topics: self.load_list()?.unwrap_or_default(),
            applications: self.load_list()?.unwrap_or_default(),
            settings: self.load_settings()?.unwrap_or_default(),
            last_modified: self.last_modified()?,
        })
    }

    /// Replace all four collections and `lastModified` in one transaction,
    /// logging the conflicts the merge resolved alongside.
    pub fn replace_snapshot(
        &self,
        snapshot: &Snapshot,
        conflicts: &[ConflictResolution],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        Self::set_json_on(&tx, Collection::DailyLogs.storage_key(), &snapshot.daily_logs)?;
        Self::set_json_on(&tx, Collection::Topics.storage_key(), &snapshot.topics)?;
        Self::set_json_on(
            &tx,
            Collection::Applications.storage_key(),
            &snapshot.applications,
        )?;
        Self::set_json_on(&tx, Collection::Settings.storage_key(), &snapshot.settings)?;
        match snapshot.last_modified {
            Some(at) => Self::set_json_on(&tx, LAST_MODIFIED_KEY, &at)?,
            None => {
                tx.execute(
                    "DELETE FROM kv_store WHERE key = ?",
                    params![LAST_MODIFIED_KEY],
                )?;
            }
        }

        let resolved_at = Utc::now();
        for conflict in conflicts {
            tx.execute(
                "INSERT INTO sync_conflicts (
                    collection, record_key, local_updated_at, remote_updated_at, winner, resolved_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    conflict.collection.storage_key(),
                    conflict.record_key,
                    conflict.local_updated_at,
                    conflict.remote_updated_at,
                    conflict.winner.as_str(),
                    resolved_at,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// The remote row key, generated and persisted on first use
    pub fn ensure_user_id(&self) -> Result<String> {
        if let Some(existing) = self.get_json::<String>(USER_ID_KEY)? {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }

        let user_id = RecordId::new().to_string();
        Self::set_json_on(self.conn, USER_ID_KEY, &user_id)?;
        tracing::info!("Generated local user id {user_id}");
        Ok(user_id)
    }

    /// Most recently resolved conflicts, newest first
    pub fn list_conflicts(&self, limit: usize) -> Result<Vec<SyncConflict>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, collection, record_key, local_updated_at, remote_updated_at, winner, resolved_at
             FROM sync_conflicts
             ORDER BY resolved_at DESC, id DESC
             LIMIT ?",
        )?;

        let conflicts = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                let winner: String = row.get(5)?;
                Ok(SyncConflict {
                    id: row.get(0)?,
                    collection: row.get(1)?,
                    record_key: row.get(2)?,
                    local_updated_at: row.get(3)?,
                    remote_updated_at: row.get(4)?,
                    winner: winner.parse::<ConflictSide>().map_err(|error| {
                        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error))
                    })?,
                    resolved_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::PracticeLog;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_absent_key_is_distinct_from_empty_list() {
        let db = setup();
        let store = LocalStore::new(db.connection());

        assert!(store.load_list::<PracticeLog>().unwrap().is_none());

        store.save_list::<PracticeLog>(&[]).unwrap();
        assert_eq!(store.load_list::<PracticeLog>().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_read_snapshot_of_fresh_store_is_empty() {
        let db = setup();
        let store = LocalStore::new(db.connection());
        assert_eq!(store.read_snapshot().unwrap(), Snapshot::default());
    }

    #[test]
    fn test_replace_snapshot_round_trips_and_logs_conflicts() {
        let db = setup();
        let store = LocalStore::new(db.connection());

        let mut log = PracticeLog::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 30);
        log.updated_at = Some(crate::util::now());
        let snapshot = Snapshot {
            daily_logs: vec![log.clone()],
            settings: Settings::initial(),
            last_modified: Some(Utc::now()),
            ..Snapshot::default()
        };
        let conflict = ConflictResolution {
            collection: Collection::DailyLogs,
            record_key: log.id.to_string(),
            local_updated_at: None,
            remote_updated_at: log.updated_at,
            winner: ConflictSide::Remote,
        };

        store.replace_snapshot(&snapshot, &[conflict]).unwrap();

        let loaded = store.read_snapshot().unwrap();
        assert_eq!(loaded.daily_logs, vec![log.clone()]);
        assert_eq!(loaded.settings, Settings::initial());
        assert_eq!(
            loaded.last_modified.map(|at| at.timestamp_millis()),
            snapshot.last_modified.map(|at| at.timestamp_millis())
        );
        assert_eq!(loaded.topics, Vec::new());

        let conflicts = store.list_conflicts(10).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].record_key, log.id.to_string());
        assert_eq!(conflicts[0].winner, ConflictSide::Remote);
    }

    #[test]
    fn test_corrupt_blob_is_a_serialization_error() {
        let db = setup();
        let store = LocalStore::new(db.connection());
        store.set_raw("dailyLogs", "{not json").unwrap();
        assert!(matches!(
            store.load_list::<PracticeLog>(),
            Err(crate::Error::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_conflict_winner_is_rejected() {
        let db = setup();
        let store = LocalStore::new(db.connection());
        db.connection()
            .execute(
                "INSERT INTO sync_conflicts (collection, record_key, winner, resolved_at)
                 VALUES ('dailyLogs', 'a', 'REMOTE', '2024-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.list_conflicts(10),
            Err(crate::Error::Database(_))
        ));
    }

    #[test]
    fn test_ensure_user_id_is_stable() {
        let db = setup();
        let store = LocalStore::new(db.connection());
        let first = store.ensure_user_id().unwrap();
        let second = store.ensure_user_id().unwrap();
        assert_eq!(first, second);
    }
}
