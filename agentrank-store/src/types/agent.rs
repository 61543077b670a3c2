//! Agent identity and progression state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable agent identifier
pub type AgentId = String;

/// Skill points a freshly tracked agent starts with
pub const INITIAL_SKILL_POINTS: f64 = 1.0;

/// Communication score a freshly tracked agent starts with
pub const INITIAL_COMMUNICATION_SCORE: f64 = 60.0;

/// One tracked agent identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// Underlying model the agent runs on
    pub model: String,
    /// Bounded domain of responsibility
    pub scope: String,
    pub skill_points: f64,
    pub experience_points: f64,
    pub communication_score: f64,
    pub total_commits: f64,
    pub total_bugs: f64,
    /// False once halted; never flipped back by scoring
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new agent with starting scores
    pub fn new(
        id: impl Into<AgentId>,
        name: impl Into<String>,
        model: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            scope: scope.into(),
            skill_points: INITIAL_SKILL_POINTS,
            experience_points: 0.0,
            communication_score: INITIAL_COMMUNICATION_SCORE,
            total_commits: 0.0,
            total_bugs: 0.0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.skill_points <= 0.0
    }

    /// Bump `updated_at` after a mutation
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Read-only projection of an agent with its derived halt flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    #[serde(flatten)]
    pub agent: Agent,
    pub halted: bool,
}

impl From<Agent> for AgentStatus {
    fn from(agent: Agent) -> Self {
        let halted = agent.is_halted();
        Self { agent, halted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_defaults() {
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        assert_eq!(agent.skill_points, 1.0);
        assert_eq!(agent.experience_points, 0.0);
        assert_eq!(agent.communication_score, 60.0);
        assert_eq!(agent.total_commits, 0.0);
        assert_eq!(agent.total_bugs, 0.0);
        assert!(agent.active);
        assert!(!agent.is_halted());
    }

    #[test]
    fn test_status_reports_halted_at_zero_skill() {
        let mut agent = Agent::new("builder", "Builder", "sonnet", "backend");
        agent.skill_points = 0.0;
        let status = AgentStatus::from(agent);
        assert!(status.halted);
    }

    #[test]
    fn test_status_serializes_flat() {
        let agent = Agent::new("builder", "Builder", "sonnet", "backend");
        let json = serde_json::to_value(AgentStatus::from(agent)).unwrap();
        assert_eq!(json["id"], "builder");
        assert_eq!(json["halted"], false);
    }
}
