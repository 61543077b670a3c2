//! In-memory store used as a test double
//!
//! Honors the same contract as [`CozoStore`](super::CozoStore), and can be
//! told to fail writes to a partition so error paths are testable.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::RwLock;

use async_trait::async_trait;

use super::partition::Partition;
use super::traits::ProgressStore;

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    partitions: HashMap<Partition, BTreeMap<String, String>>,
    failing: HashSet<Partition>,
}

/// BTreeMap-per-partition store
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                open: true,
                ..MemoryState::default()
            }),
        }
    }

    /// A store that failed to initialize
    pub fn unavailable() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Make every later write to `partition` fail
    pub fn fail_writes_to(&self, partition: Partition) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(partition);
        }
    }

    /// Number of rows in a partition
    pub fn len(&self, partition: Partition) -> usize {
        self.state
            .read()
            .ok()
            .and_then(|state| state.partitions.get(&partition).map(BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, partition: Partition) -> bool {
        self.len(partition) == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    fn is_available(&self) -> bool {
        self.state.read().map(|state| state.open).unwrap_or(false)
    }

    async fn put_entry(&self, partition: Partition, key: &str, value: &str) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        if !state.open || state.failing.contains(&partition) {
            return false;
        }
        state
            .partitions
            .entry(partition)
            .or_default()
            .insert(key.to_string(), value.to_string());
        true
    }

    async fn get_entry(&self, partition: Partition, key: &str) -> Option<String> {
        let state = self.state.read().ok()?;
        if !state.open {
            return None;
        }
        state.partitions.get(&partition)?.get(key).cloned()
    }

    async fn range_entries(
        &self,
        partition: Partition,
        start: &str,
        end: &str,
        limit: usize,
    ) -> Vec<(String, String)> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        if !state.open || start >= end {
            return Vec::new();
        }
        let Some(rows) = state.partitions.get(&partition) else {
            return Vec::new();
        };
        rows.range::<str, _>((Bound::Included(start), Bound::Excluded(end)))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    async fn scan_entries(&self, partition: Partition, limit: usize) -> Vec<(String, String)> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        if !state.open {
            return Vec::new();
        }
        state
            .partitions
            .get(&partition)
            .map(|rows| {
                rows.iter()
                    .take(limit)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn close(&self) {
        if let Ok(mut state) = self.state.write() {
            state.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agent, CommitData};

    #[tokio::test]
    async fn test_put_and_get_agent() {
        let store = MemoryStore::new();
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");

        assert!(store.put_agent(&agent).await);
        assert_eq!(store.get_agent("builder").await, Some(agent));
        assert_eq!(store.get_agent("missing").await, None);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_neutral() {
        let store = MemoryStore::unavailable();
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");

        assert!(!store.is_available());
        assert!(!store.put_agent(&agent).await);
        assert!(store.get_agent("builder").await.is_none());
        assert!(store.get_all_agents(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_disables_store() {
        let store = MemoryStore::new();
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        store.put_agent(&agent).await;

        store.close().await;
        store.close().await;

        assert!(!store.is_available());
        assert!(store.get_agent("builder").await.is_none());
        assert!(!store.put_agent(&agent).await);
    }

    #[tokio::test]
    async fn test_failing_partition_rejects_writes_only_there() {
        let store = MemoryStore::new();
        store.fail_writes_to(Partition::Commits);

        let commit = CommitData::new("builder", "/work/app", "abc123", "fix");
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");

        assert!(!store.put_commit(&commit).await);
        assert!(store.put_agent(&agent).await);
        assert!(store.is_empty(Partition::Commits));
    }

    #[tokio::test]
    async fn test_range_with_inverted_bounds_is_empty() {
        let store = MemoryStore::new();
        store.put_entry(Partition::Agents, "b", "{}").await;
        assert!(
            store
                .range_entries(Partition::Agents, "z", "a", 10)
                .await
                .is_empty()
        );
    }
}
