//! Storage contract for progression data
//!
//! Backends implement a small raw surface over named partitions; the typed
//! accessors are provided on top of it. Every method is best-effort: faults
//! become `false`, `None` or an empty `Vec`, never an error or a panic.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::partition::{
    Partition, activity_key, commit_key, communication_key, owner_range, retrospective_key,
};
use crate::{
    ActivityEntry, Agent, CommitData, CommunicationScoreEvent, MigrationRecord, ProjectProfile,
    RetrospectiveEntry,
};

/// Storage operations over the partitioned progression store
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// True iff the backend initialized and has not been closed
    fn is_available(&self) -> bool;

    /// Write one raw value
    async fn put_entry(&self, partition: Partition, key: &str, value: &str) -> bool;

    /// Read one raw value
    async fn get_entry(&self, partition: Partition, key: &str) -> Option<String>;

    /// Rows with `start <= key < end`, in key order, at most `limit`
    async fn range_entries(
        &self,
        partition: Partition,
        start: &str,
        end: &str,
        limit: usize,
    ) -> Vec<(String, String)>;

    /// First `limit` rows of a partition, in key order
    async fn scan_entries(&self, partition: Partition, limit: usize) -> Vec<(String, String)>;

    /// Close every sub-store and the root. Safe to call repeatedly.
    async fn close(&self);

    // ===== Agents =====

    async fn put_agent(&self, agent: &Agent) -> bool {
        put_encoded(self, Partition::Agents, &agent.id, agent).await
    }

    async fn get_agent(&self, id: &str) -> Option<Agent> {
        get_decoded(self, Partition::Agents, id).await
    }

    async fn get_all_agents(&self, limit: usize) -> Vec<Agent> {
        decode_rows(Partition::Agents, self.scan_entries(Partition::Agents, limit).await)
    }

    // ===== Commits =====

    async fn put_commit(&self, commit: &CommitData) -> bool {
        let key = commit_key(&commit.project_path, &commit.commit_hash);
        put_encoded(self, Partition::Commits, &key, commit).await
    }

    async fn get_commit(&self, project_path: &str, commit_hash: &str) -> Option<CommitData> {
        let key = commit_key(project_path, commit_hash);
        get_decoded(self, Partition::Commits, &key).await
    }

    async fn get_commits_for_project(&self, project_path: &str, limit: usize) -> Vec<CommitData> {
        let (start, end) = owner_range(project_path);
        let rows = self
            .range_entries(Partition::Commits, &start, &end, limit)
            .await;
        decode_rows(Partition::Commits, rows)
    }

    async fn get_all_commits(&self, limit: usize) -> Vec<CommitData> {
        decode_rows(Partition::Commits, self.scan_entries(Partition::Commits, limit).await)
    }

    // ===== Communication events =====

    /// Append an event under `agent_id:commit_hash:ordinal`
    async fn put_communication_event(
        &self,
        ordinal: &str,
        event: &CommunicationScoreEvent,
    ) -> bool {
        let key = communication_key(&event.agent_id, &event.commit_hash, ordinal);
        put_encoded(self, Partition::Communication, &key, event).await
    }

    async fn get_communication_events(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> Vec<CommunicationScoreEvent> {
        let (start, end) = owner_range(agent_id);
        let rows = self
            .range_entries(Partition::Communication, &start, &end, limit)
            .await;
        decode_rows(Partition::Communication, rows)
    }

    async fn get_all_communication_events(&self, limit: usize) -> Vec<CommunicationScoreEvent> {
        let rows = self.scan_entries(Partition::Communication, limit).await;
        decode_rows(Partition::Communication, rows)
    }

    // ===== Retrospectives =====

    async fn put_retrospective(&self, agent_id: &str, entry: &RetrospectiveEntry) -> bool {
        let key = retrospective_key(agent_id, &entry.commit);
        put_encoded(self, Partition::Retrospectives, &key, entry).await
    }

    async fn get_retrospective(
        &self,
        agent_id: &str,
        commit_hash: &str,
    ) -> Option<RetrospectiveEntry> {
        let key = retrospective_key(agent_id, commit_hash);
        get_decoded(self, Partition::Retrospectives, &key).await
    }

    async fn get_retrospectives(&self, agent_id: &str, limit: usize) -> Vec<RetrospectiveEntry> {
        let (start, end) = owner_range(agent_id);
        let rows = self
            .range_entries(Partition::Retrospectives, &start, &end, limit)
            .await;
        decode_rows(Partition::Retrospectives, rows)
    }

    // ===== Activities =====

    async fn put_activity(&self, agent_id: &str, entry: &ActivityEntry) -> bool {
        let key = activity_key(agent_id, &entry.timestamp);
        put_encoded(self, Partition::Activities, &key, entry).await
    }

    async fn get_activities(&self, agent_id: &str, limit: usize) -> Vec<ActivityEntry> {
        let (start, end) = owner_range(agent_id);
        let rows = self
            .range_entries(Partition::Activities, &start, &end, limit)
            .await;
        decode_rows(Partition::Activities, rows)
    }

    // ===== Migration bookkeeping =====

    async fn put_migration_record(&self, record: &MigrationRecord) -> bool {
        put_encoded(self, Partition::Migrations, &record.source_path, record).await
    }

    async fn get_migration_record(&self, source_path: &str) -> Option<MigrationRecord> {
        get_decoded(self, Partition::Migrations, source_path).await
    }

    // ===== Project profiles =====

    async fn put_project_profile(&self, profile: &ProjectProfile) -> bool {
        put_encoded(self, Partition::Projects, &profile.project_path, profile).await
    }

    async fn get_project_profile(&self, project_path: &str) -> Option<ProjectProfile> {
        get_decoded(self, Partition::Projects, project_path).await
    }

    async fn get_all_project_profiles(&self, limit: usize) -> Vec<ProjectProfile> {
        decode_rows(Partition::Projects, self.scan_entries(Partition::Projects, limit).await)
    }
}

async fn put_encoded<S, T>(store: &S, partition: Partition, key: &str, value: &T) -> bool
where
    S: ProgressStore + ?Sized,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => store.put_entry(partition, key, &json).await,
        Err(e) => {
            tracing::warn!(%partition, key, error = %e, "Failed to encode value");
            false
        }
    }
}

async fn get_decoded<S, T>(store: &S, partition: Partition, key: &str) -> Option<T>
where
    S: ProgressStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = store.get_entry(partition, key).await?;
    decode(partition, key, &raw)
}

fn decode<T: DeserializeOwned>(partition: Partition, key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%partition, key, error = %e, "Skipping undecodable row");
            None
        }
    }
}

fn decode_rows<T: DeserializeOwned>(partition: Partition, rows: Vec<(String, String)>) -> Vec<T> {
    rows.iter()
        .filter_map(|(key, raw)| decode(partition, key, raw))
        .collect()
}
