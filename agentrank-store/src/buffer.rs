//! Write buffer for batched persistence.
//!
//! The `WriteBuffer` holds the final intended state for each logical key
//! (`agent:<id>`, `commit:<project>:<hash>`, ...) until it is flushed.
//! Staging a key twice replaces the earlier value, so only the last state
//! before a flush is ever written.
//!
//! ## Usage Pattern
//!
//! 1. Read current state (staged intent first, then the store)
//! 2. Compute the next state and stage it: `buffer.buffer_agent(agent)`
//! 3. At session end, write everything in one pass: `buffer.flush(&store)`
//!
//! A flush attempts every entry, reports failures per key, and always leaves
//! the buffer empty so a bad entry is never retried forever.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::store::{ProgressStore, activity_key, commit_key, communication_key, retrospective_key};
use crate::{
    ActivityEntry, Agent, AgentId, CommitData, CommunicationScoreEvent, RetrospectiveEntry,
};

/// One staged write plus the routing data needed to perform it
#[derive(Debug, Clone, PartialEq)]
pub enum BufferedWrite {
    Agent(Agent),
    Commit(CommitData),
    Communication {
        ordinal: String,
        event: CommunicationScoreEvent,
    },
    Retrospective {
        agent_id: AgentId,
        entry: RetrospectiveEntry,
    },
    Activity {
        agent_id: AgentId,
        entry: ActivityEntry,
    },
}

impl BufferedWrite {
    async fn write_to(&self, store: &dyn ProgressStore) -> bool {
        match self {
            Self::Agent(agent) => store.put_agent(agent).await,
            Self::Commit(commit) => store.put_commit(commit).await,
            Self::Communication { ordinal, event } => {
                store.put_communication_event(ordinal, event).await
            }
            Self::Retrospective { agent_id, entry } => {
                store.put_retrospective(agent_id, entry).await
            }
            Self::Activity { agent_id, entry } => store.put_activity(agent_id, entry).await,
        }
    }
}

/// Outcome of a flush
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushResult {
    pub entries_written: usize,
    /// One `"<logical key>: <reason>"` line per failed entry
    pub errors: Vec<String>,
}

impl FlushResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Staging map from logical key to final intended value
#[derive(Debug, Default)]
pub struct WriteBuffer {
    entries: BTreeMap<String, BufferedWrite>,
    sequence: u64,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_agent(&mut self, agent: Agent) {
        let key = format!("agent:{}", agent.id);
        self.stage(key, BufferedWrite::Agent(agent));
    }

    pub fn buffer_commit(&mut self, commit: CommitData) {
        let key = format!(
            "commit:{}",
            commit_key(&commit.project_path, &commit.commit_hash)
        );
        self.stage(key, BufferedWrite::Commit(commit));
    }

    /// Stage a grading event under a fresh ordinal, which is returned.
    ///
    /// Repeated gradings of the same commit never collapse into one entry.
    pub fn buffer_communication_event(&mut self, event: CommunicationScoreEvent) -> String {
        let ordinal = self.next_ordinal();
        let key = format!(
            "communication:{}",
            communication_key(&event.agent_id, &event.commit_hash, &ordinal)
        );
        self.stage(
            key,
            BufferedWrite::Communication {
                ordinal: ordinal.clone(),
                event,
            },
        );
        ordinal
    }

    pub fn buffer_retrospective(
        &mut self,
        agent_id: impl Into<AgentId>,
        entry: RetrospectiveEntry,
    ) {
        let agent_id = agent_id.into();
        let key = format!("retrospective:{}", retrospective_key(&agent_id, &entry.commit));
        self.stage(key, BufferedWrite::Retrospective { agent_id, entry });
    }

    pub fn buffer_activity(&mut self, agent_id: impl Into<AgentId>, entry: ActivityEntry) {
        let agent_id = agent_id.into();
        let key = format!("activity:{}", activity_key(&agent_id, &entry.timestamp));
        self.stage(key, BufferedWrite::Activity { agent_id, entry });
    }

    /// Staged intent for an agent, if any
    pub fn agent(&self, id: &str) -> Option<&Agent> {
        match self.entries.get(&format!("agent:{id}")) {
            Some(BufferedWrite::Agent(agent)) => Some(agent),
            _ => None,
        }
    }

    /// Staged commit, if any
    pub fn commit(&self, project_path: &str, commit_hash: &str) -> Option<&CommitData> {
        let key = format!("commit:{}", commit_key(project_path, commit_hash));
        match self.entries.get(&key) {
            Some(BufferedWrite::Commit(commit)) => Some(commit),
            _ => None,
        }
    }

    /// Staged entries keyed by logical key
    pub fn entries(&self) -> impl Iterator<Item = (&str, &BufferedWrite)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard everything without writing
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write every staged entry to `store`, then empty the buffer.
    pub async fn flush(&mut self, store: &dyn ProgressStore) -> FlushResult {
        let entries = std::mem::take(&mut self.entries);
        let mut result = FlushResult::default();
        if entries.is_empty() {
            return result;
        }

        for (key, write) in &entries {
            if write.write_to(store).await {
                result.entries_written += 1;
            } else if store.is_available() {
                result.errors.push(format!("{key}: write rejected by store"));
            } else {
                result.errors.push(format!("{key}: store unavailable"));
            }
        }

        tracing::debug!(
            written = result.entries_written,
            failed = result.errors.len(),
            "Flushed write buffer"
        );
        result
    }

    fn stage(&mut self, key: String, write: BufferedWrite) {
        tracing::trace!(key, "Staged write");
        self.entries.insert(key, write);
    }

    fn next_ordinal(&mut self) -> String {
        self.sequence += 1;
        format!("{:016}-{:06}", Utc::now().timestamp_micros(), self.sequence)
    }
}
