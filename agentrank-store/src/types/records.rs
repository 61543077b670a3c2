//! Commit, grading, retrospective and activity records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentId, Grade};

/// Experience granted for a bare commit event
pub const COMMIT_EXPERIENCE: f64 = 5.0;

/// One completed commit, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitData {
    pub agent_id: AgentId,
    pub commit_hash: String,
    pub project_path: String,
    pub task_description: String,
    pub experience_gained: f64,
    pub communication_score_change: f64,
    pub timestamp: DateTime<Utc>,
}

impl CommitData {
    pub fn new(
        agent_id: impl Into<AgentId>,
        project_path: impl Into<String>,
        commit_hash: impl Into<String>,
        task_description: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            commit_hash: commit_hash.into(),
            project_path: project_path.into(),
            task_description: task_description.into(),
            experience_gained: COMMIT_EXPERIENCE,
            communication_score_change: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of one grading of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationScoreEvent {
    pub agent_id: AgentId,
    pub commit_hash: String,
    pub project_path: String,
    pub grade: Grade,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Combined agent and user review of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrospectiveEntry {
    pub commit: String,
    pub timestamp: DateTime<Utc>,
    pub task: String,
    pub agent_grade: Grade,
    pub user_grade: Grade,
    /// Communication score before this review was applied
    pub score_before: f64,
    /// Communication score after this review was applied
    pub score_after: f64,
    #[serde(default)]
    pub agent_note: String,
    #[serde(default)]
    pub user_note: String,
}

/// Free-text journal entry of what an agent did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub task: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub decisions: Vec<String>,
}

impl ActivityEntry {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            task: task.into(),
            actions: Vec::new(),
            outcome: String::new(),
            decisions: Vec::new(),
        }
    }
}
