//! CozoDB-backed progression store
//!
//! This module provides the `CozoStore` struct that wraps CozoDB with a
//! RocksDB backend (or the in-memory engine for `:memory:`). It handles path
//! resolution, capacity validation, schema initialization and migrations,
//! and keeps one handle per partition so sub-stores can be closed on their own.
//!
//! Opening never fails: any error leaves the store unavailable, and every
//! accessor then returns its neutral value.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use agentrank_paths::StoreLocation;
use async_trait::async_trait;
use chrono::Utc;
use cozo::{DataValue, DbInstance, NamedRows, ScriptMutability};

use super::partition::Partition;
use super::schema::{MIGRATIONS, Migration};
use super::traits::ProgressStore;
use crate::{ProgressError, Result, StoreConfig};

/// CozoDB-backed progression store
pub struct CozoStore {
    db: RwLock<Option<Arc<DbInstance>>>,
    open_partitions: RwLock<HashSet<Partition>>,
    location: StoreLocation,
    max_size: u64,
    compression: bool,
}

impl CozoStore {
    /// Open or create the store described by `config`.
    ///
    /// Returns an unavailable store instead of an error when anything goes wrong.
    pub fn open(config: &StoreConfig) -> Self {
        let location = config.location();
        match Self::try_open(config, &location) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(
                    location = ?location,
                    error = %e,
                    "Progress store unavailable, tracking disabled"
                );
                Self {
                    db: RwLock::new(None),
                    open_partitions: RwLock::new(HashSet::new()),
                    location,
                    max_size: config.max_size.unwrap_or_default(),
                    compression: config.compression_enabled(),
                }
            }
        }
    }

    fn try_open(config: &StoreConfig, location: &StoreLocation) -> Result<Self> {
        let max_size = config.validated_max_size()?;

        let db = match location {
            StoreLocation::InMemory => DbInstance::new("mem", "", "")
                .map_err(|e| ProgressError::Database(format!("Failed to open database: {e}")))?,
            StoreLocation::Disk(path) => {
                // Ensure directory exists
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                warn_if_over_capacity(path, max_size);
                DbInstance::new("rocksdb", path, "").map_err(|e| {
                    ProgressError::Database(format!("Failed to open database: {e}"))
                })?
            }
        };

        ensure_schema(&db)?;

        let mut open_partitions = HashSet::new();
        for partition in Partition::ALL {
            open_partition(&db, partition)?;
            open_partitions.insert(partition);
        }

        if !config.compression_enabled() {
            tracing::debug!("Compression disabled in config; block compression is engine-managed");
        }

        tracing::debug!(location = ?location, max_size, "Opened progress store");

        Ok(Self {
            db: RwLock::new(Some(Arc::new(db))),
            open_partitions: RwLock::new(open_partitions),
            location: location.clone(),
            max_size,
            compression: config.compression_enabled(),
        })
    }

    /// Where this store lives
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Validated capacity limit in bytes
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    /// Whether a single partition is still open
    pub fn is_partition_open(&self, partition: Partition) -> bool {
        self.open_partitions
            .read()
            .map(|open| open.contains(&partition))
            .unwrap_or(false)
    }

    /// Close one sub-store, leaving the others usable.
    ///
    /// Returns false if it was already closed.
    pub fn close_partition(&self, partition: Partition) -> bool {
        self.open_partitions
            .write()
            .map(|mut open| open.remove(&partition))
            .unwrap_or(false)
    }

    /// Current schema version, or `None` when unavailable
    pub fn schema_version(&self) -> Option<u32> {
        let db = self.root()?;
        get_schema_version(&db).ok()
    }

    fn root(&self) -> Option<Arc<DbInstance>> {
        self.db.read().ok()?.clone()
    }

    /// Guard shared by every accessor: store open and partition open
    fn handle(&self, partition: Partition) -> Result<Arc<DbInstance>> {
        let db = self.root().ok_or(ProgressError::Unavailable)?;
        if !self.is_partition_open(partition) {
            return Err(ProgressError::Database(format!(
                "partition {partition} is closed"
            )));
        }
        Ok(db)
    }

    fn try_put(&self, partition: Partition, key: &str, value: &str) -> Result<()> {
        let db = self.handle(partition)?;
        let query = format!(
            r#"?[key, value] <- [[$key, $value]]
            :put {} {{ key => value }}"#,
            partition.as_str()
        );
        run_mutation(&db, &query, params([("key", key), ("value", value)]))?;
        Ok(())
    }

    fn try_get(&self, partition: Partition, key: &str) -> Result<Option<String>> {
        let db = self.handle(partition)?;
        let query = format!(
            "?[value] := *{}{{key, value}}, key = $key",
            partition.as_str()
        );
        let rows = run_query(&db, &query, params([("key", key)]))?;
        Ok(rows
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.get_str())
            .map(str::to_string))
    }

    fn try_range(
        &self,
        partition: Partition,
        start: &str,
        end: &str,
        limit: usize,
    ) -> Result<Vec<(String, String)>> {
        let db = self.handle(partition)?;
        let query = format!(
            r#"?[key, value] := *{}{{key, value}}, key >= $start, key < $end
            :order key
            :limit {}"#,
            partition.as_str(),
            limit
        );
        let rows = run_query(&db, &query, params([("start", start), ("end", end)]))?;
        rows_to_pairs(rows)
    }

    fn try_scan(&self, partition: Partition, limit: usize) -> Result<Vec<(String, String)>> {
        let db = self.handle(partition)?;
        let query = format!(
            r#"?[key, value] := *{}{{key, value}}
            :order key
            :limit {}"#,
            partition.as_str(),
            limit
        );
        let rows = run_query(&db, &query, BTreeMap::new())?;
        rows_to_pairs(rows)
    }
}

#[async_trait]
impl ProgressStore for CozoStore {
    fn is_available(&self) -> bool {
        self.db.read().map(|db| db.is_some()).unwrap_or(false)
    }

    async fn put_entry(&self, partition: Partition, key: &str, value: &str) -> bool {
        match self.try_put(partition, key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%partition, key, error = %e, "Write failed");
                false
            }
        }
    }

    async fn get_entry(&self, partition: Partition, key: &str) -> Option<String> {
        self.try_get(partition, key).unwrap_or_else(|e| {
            tracing::debug!(%partition, key, error = %e, "Read failed");
            None
        })
    }

    async fn range_entries(
        &self,
        partition: Partition,
        start: &str,
        end: &str,
        limit: usize,
    ) -> Vec<(String, String)> {
        if limit == 0 || start >= end {
            return Vec::new();
        }
        self.try_range(partition, start, end, limit).unwrap_or_else(|e| {
            tracing::debug!(%partition, error = %e, "Range read failed");
            Vec::new()
        })
    }

    async fn scan_entries(&self, partition: Partition, limit: usize) -> Vec<(String, String)> {
        if limit == 0 {
            return Vec::new();
        }
        self.try_scan(partition, limit).unwrap_or_else(|e| {
            tracing::debug!(%partition, error = %e, "Scan failed");
            Vec::new()
        })
    }

    async fn close(&self) {
        for partition in Partition::ALL {
            self.close_partition(partition);
        }
        let closed = self
            .db
            .write()
            .map(|mut db| db.take().is_some())
            .unwrap_or(false);
        if closed {
            tracing::debug!(location = ?self.location, "Closed progress store");
        }
    }
}

impl std::fmt::Debug for CozoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CozoStore")
            .field("location", &self.location)
            .field("max_size", &self.max_size)
            .field("available", &self.is_available())
            .finish()
    }
}

/// Run a query and return results
fn run_query(
    db: &DbInstance,
    query: &str,
    params: BTreeMap<String, DataValue>,
) -> Result<NamedRows> {
    db.run_script(query, params, ScriptMutability::Immutable)
        .map_err(|e| ProgressError::Database(format!("Query failed: {e}")))
}

/// Run a mutation query
fn run_mutation(
    db: &DbInstance,
    query: &str,
    params: BTreeMap<String, DataValue>,
) -> Result<NamedRows> {
    db.run_script(query, params, ScriptMutability::Mutable)
        .map_err(|e| ProgressError::Database(format!("Mutation failed: {e}")))
}

fn params<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, DataValue> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), DataValue::from(value)))
        .collect()
}

fn rows_to_pairs(rows: NamedRows) -> Result<Vec<(String, String)>> {
    rows.rows
        .iter()
        .map(|row| {
            let key = row
                .first()
                .and_then(|v| v.get_str())
                .ok_or_else(|| ProgressError::Database("Invalid key type".into()))?;
            let value = row
                .get(1)
                .and_then(|v| v.get_str())
                .ok_or_else(|| ProgressError::Database("Invalid value type".into()))?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Get current schema version from database
fn get_schema_version(db: &DbInstance) -> Result<u32> {
    let query = "?[max(version)] := *schema_version{version}";

    match run_query(db, query, BTreeMap::new()) {
        Ok(rows) => Ok(rows
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.get_int())
            .map(|v| v as u32)
            .unwrap_or(0)),
        Err(e) => {
            // Table might not exist yet
            let msg = e.to_string();
            if msg.contains("not found") || msg.contains("Cannot find") {
                Ok(0)
            } else {
                Err(e)
            }
        }
    }
}

/// Ensure schema is up to date
fn ensure_schema(db: &DbInstance) -> Result<()> {
    let current = get_schema_version(db)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply_migration(db, migration)?;
    }

    Ok(())
}

/// Apply a single migration
fn apply_migration(db: &DbInstance, migration: &Migration) -> Result<()> {
    db.run_script(migration.script, BTreeMap::new(), ScriptMutability::Mutable)
        .map_err(|e| {
            ProgressError::Migration(format!("Migration {} failed: {e}", migration.version))
        })?;

    let mut record = BTreeMap::new();
    record.insert(
        "version".to_string(),
        DataValue::from(i64::from(migration.version)),
    );
    record.insert(
        "applied_at".to_string(),
        DataValue::from(Utc::now().timestamp()),
    );
    record.insert(
        "description".to_string(),
        DataValue::from(migration.description),
    );

    run_mutation(
        db,
        r#"?[version, applied_at, description] <- [[$version, $applied_at, $description]]
        :put schema_version { version => applied_at, description }"#,
        record,
    )
    .map_err(|e| {
        ProgressError::Migration(format!(
            "Failed to record migration {}: {e}",
            migration.version
        ))
    })?;

    tracing::debug!(version = migration.version, "Applied schema migration");
    Ok(())
}

/// Probe a partition's relation so a missing one fails the open
fn open_partition(db: &DbInstance, partition: Partition) -> Result<()> {
    let query = format!(
        r#"?[key] := *{}{{key}}
        :limit 1"#,
        partition.as_str()
    );
    run_query(db, &query, BTreeMap::new())
        .map(|_| ())
        .map_err(|e| ProgressError::Database(format!("Failed to open partition {partition}: {e}")))
}

fn warn_if_over_capacity(path: &Path, max_size: u64) {
    let used = dir_size(path);
    if used > max_size {
        tracing::warn!(
            path = %path.display(),
            used,
            max_size,
            "Progress store exceeds its configured capacity"
        );
    }
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.metadata() {
            Ok(meta) if meta.is_dir() => dir_size(&entry.path()),
            Ok(meta) => meta.len(),
            Err(_) => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::super::schema::CURRENT_SCHEMA_VERSION;
    use super::*;
    use crate::config::{MAX_STORE_SIZE, MIN_STORE_SIZE};
    use crate::{
        ActivityEntry, Agent, CommitData, CommunicationScoreEvent, Grade, MigrationRecord,
        ProjectProfile, RetrospectiveEntry,
    };
    use tempfile::TempDir;

    fn memory_store() -> CozoStore {
        let store = CozoStore::open(&StoreConfig::in_memory());
        assert!(store.is_available());
        store
    }

    fn event(agent_id: &str, commit: &str, grade: Grade) -> CommunicationScoreEvent {
        CommunicationScoreEvent {
            agent_id: agent_id.into(),
            commit_hash: commit.into(),
            project_path: "/work/app".into(),
            grade,
            timestamp: Utc::now(),
            reason: Some("clear summary".into()),
        }
    }

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = memory_store();
        assert!(store.location().is_in_memory());
        assert_eq!(store.schema_version(), Some(CURRENT_SCHEMA_VERSION));
        for partition in Partition::ALL {
            assert!(store.is_partition_open(partition));
        }
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/deeper/store");
        let store = CozoStore::open(&StoreConfig::at(&path));

        assert!(store.is_available());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopen_existing_db_keeps_data() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::at(tmp.path().join("store"));
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");

        {
            let store = CozoStore::open(&config);
            assert!(store.put_agent(&agent).await);
            store.close().await;
        }

        let store = CozoStore::open(&config);
        assert_eq!(store.schema_version(), Some(CURRENT_SCHEMA_VERSION));
        assert_eq!(store.get_agent("builder").await, Some(agent));
    }

    #[tokio::test]
    async fn test_capacity_outside_range_leaves_store_unavailable() {
        for size in [MIN_STORE_SIZE - 1, MAX_STORE_SIZE + 1] {
            let store = CozoStore::open(&StoreConfig::in_memory().with_max_size(size));
            assert!(!store.is_available());
            let agent = Agent::new("builder", "Builder", "sonnet", "backend");
            assert!(!store.put_agent(&agent).await);
            assert!(store.get_agent("builder").await.is_none());
            assert!(store.get_all_agents(10).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unopenable_path_leaves_store_unavailable() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = CozoStore::open(&StoreConfig::at(blocker.join("store")));
        assert!(!store.is_available());
        store.close().await;
    }

    #[tokio::test]
    async fn test_round_trip_every_entity_kind() {
        let store = memory_store();

        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        assert!(store.put_agent(&agent).await);
        assert_eq!(store.get_agent("builder").await, Some(agent));

        let commit = CommitData::new("builder", "/work/app", "abc123", "fix login");
        assert!(store.put_commit(&commit).await);
        assert_eq!(store.get_commit("/work/app", "abc123").await, Some(commit));

        let graded = event("builder", "abc123", Grade::Good);
        assert!(store.put_communication_event("0001", &graded).await);
        assert_eq!(
            store.get_communication_events("builder", 10).await,
            vec![graded]
        );

        let retro = RetrospectiveEntry {
            commit: "abc123".into(),
            timestamp: Utc::now(),
            task: "fix login".into(),
            agent_grade: Grade::Good,
            user_grade: Grade::Excellence,
            score_before: 60.0,
            score_after: 67.0,
            agent_note: "explained the change".into(),
            user_note: "great".into(),
        };
        assert!(store.put_retrospective("builder", &retro).await);
        assert_eq!(
            store.get_retrospective("builder", "abc123").await,
            Some(retro)
        );

        let mut activity = ActivityEntry::new("refactor session");
        activity.actions = vec!["split module".into()];
        activity.outcome = "done".into();
        activity.decisions = vec!["keep API".into()];
        assert!(store.put_activity("builder", &activity).await);
        assert_eq!(store.get_activities("builder", 10).await, vec![activity]);

        let record = MigrationRecord {
            source_path: "/work/app/.agentrank/progress".into(),
            version: "0.1.0".into(),
            timestamp: Utc::now(),
            entries_migrated: 4,
        };
        assert!(store.put_migration_record(&record).await);
        assert_eq!(
            store
                .get_migration_record("/work/app/.agentrank/progress")
                .await,
            Some(record)
        );

        let profile = ProjectProfile {
            project_path: "/work/app".into(),
            name: "app".into(),
            languages: vec!["rust".into()],
            frameworks: vec!["axum".into()],
            updated_at: Utc::now(),
        };
        assert!(store.put_project_profile(&profile).await);
        assert_eq!(store.get_project_profile("/work/app").await, Some(profile));
    }

    #[tokio::test]
    async fn test_repeated_grading_keeps_every_event() {
        let store = memory_store();
        store
            .put_communication_event("0001", &event("builder", "abc123", Grade::Good))
            .await;
        store
            .put_communication_event("0002", &event("builder", "abc123", Grade::Bad))
            .await;
        store
            .put_communication_event("0001", &event("builder-2", "abc123", Grade::Good))
            .await;

        let events = store.get_communication_events("builder", 10).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].grade, Grade::Good);
        assert_eq!(events[1].grade, Grade::Bad);
        assert_eq!(store.get_all_communication_events(10).await.len(), 3);
    }

    #[tokio::test]
    async fn test_range_respects_limit() {
        let store = memory_store();
        for i in 0..5 {
            let commit = CommitData::new("builder", "/work/app", format!("c{i}"), "task");
            store.put_commit(&commit).await;
        }
        let other = CommitData::new("builder", "/work/other", "c0", "task");
        store.put_commit(&other).await;

        assert_eq!(store.get_commits_for_project("/work/app", 3).await.len(), 3);
        assert_eq!(store.get_commits_for_project("/work/app", 10).await.len(), 5);
        assert_eq!(store.get_all_commits(100).await.len(), 6);
        assert!(store.get_all_commits(0).await.is_empty());
    }

    #[tokio::test]
    async fn test_partitions_do_not_mix() {
        let store = memory_store();
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        store.put_agent(&agent).await;

        assert!(store.get_all_commits(10).await.is_empty());
        assert!(
            store
                .scan_entries(Partition::Communication, 10)
                .await
                .is_empty()
        );
        assert_eq!(store.get_all_agents(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_partition_is_independent() {
        let store = memory_store();
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        let commit = CommitData::new("builder", "/work/app", "abc123", "fix");

        assert!(store.close_partition(Partition::Commits));
        assert!(!store.close_partition(Partition::Commits));

        assert!(!store.put_commit(&commit).await);
        assert!(store.put_agent(&agent).await);
        assert!(store.is_available());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = memory_store();
        store.close_partition(Partition::Activities);

        store.close().await;
        store.close().await;

        assert!(!store.is_available());
        assert_eq!(store.schema_version(), None);
        for partition in Partition::ALL {
            assert!(!store.is_partition_open(partition));
        }
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        assert!(!store.put_agent(&agent).await);
    }

    #[tokio::test]
    async fn test_undecodable_row_is_skipped() {
        let store = memory_store();
        store.put_entry(Partition::Agents, "broken", "{not json").await;
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        store.put_agent(&agent).await;

        assert!(store.get_agent("broken").await.is_none());
        assert_eq!(store.get_all_agents(10).await, vec![agent]);
    }
}
