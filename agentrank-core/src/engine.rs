//! Scoring engine
//!
//! Applies XP/SP/CS transitions, bug penalties, leveling and halt detection.
//! Every operation reads the current agent (staged intent first, then the
//! store), computes the next state with the pure rules in [`crate::rules`],
//! and stages it in the engine's own [`WriteBuffer`]. Nothing is durable
//! until [`ScoringEngine::finalize_session`] or [`ScoringEngine::push`].
//!
//! When the store is unavailable every mutating operation is a no-op, so a
//! host keeps working with tracking silently disabled.

use std::sync::Arc;

use agentrank_store::{
    ActivityEntry, Agent, AgentId, AgentStatus, CommitData, CommunicationScoreEvent, FlushResult,
    Grade, ProgressStore, Result, RetrospectiveEntry, WriteBuffer,
};
use chrono::Utc;

use crate::notify::{Notifier, ProgressEvent, TracingNotifier};
use crate::rules::{ScoringRules, apply_bug, apply_experience, apply_grades};

/// Identity announced when a session starts
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub agent_id: AgentId,
    pub name: String,
    pub model: String,
    pub scope: String,
}

impl SessionInfo {
    pub fn new(
        agent_id: impl Into<AgentId>,
        name: impl Into<String>,
        model: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            model: model.into(),
            scope: scope.into(),
        }
    }
}

/// Combined agent and user grading of one commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReview {
    pub agent_id: AgentId,
    pub project_path: String,
    pub commit_hash: String,
    pub task: String,
    /// Raw grade value, validated before anything is staged
    pub agent_grade: i64,
    pub user_grade: i64,
    pub agent_note: String,
    pub user_note: String,
}

/// Result of a bug report
#[derive(Debug, Clone, PartialEq)]
pub struct BugReport {
    pub agent: Agent,
    /// True only for the report that halted the agent
    pub newly_halted: bool,
}

/// Stateful scoring service over a store and an owned write buffer
pub struct ScoringEngine {
    store: Arc<dyn ProgressStore>,
    buffer: WriteBuffer,
    rules: ScoringRules,
    notifier: Arc<dyn Notifier>,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn ProgressStore>, buffer: WriteBuffer, rules: ScoringRules) -> Self {
        Self {
            store,
            buffer,
            rules,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the default log-based notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    /// Number of staged, not yet flushed writes
    pub fn pending_writes(&self) -> usize {
        self.buffer.len()
    }

    /// Start tracking the session's agent, creating it on first sight
    pub async fn initialize_session_tracking(&mut self, session: &SessionInfo) -> Option<Agent> {
        if !self.store.is_available() {
            tracing::debug!("Progress store unavailable, session not tracked");
            return None;
        }

        if let Some(agent) = self.load_agent(&session.agent_id).await {
            return Some(agent);
        }

        let agent = Agent::new(
            session.agent_id.clone(),
            session.name.clone(),
            session.model.clone(),
            session.scope.clone(),
        );
        tracing::info!(agent = %agent.id, model = %agent.model, "Tracking new agent");
        self.buffer.buffer_agent(agent.clone());
        Some(agent)
    }

    pub async fn record_tool_success(&mut self, agent_id: &str, tool: &str) -> Option<Agent> {
        let amount = self.rules.tool_xp;
        tracing::trace!(agent = agent_id, tool, "Tool success");
        self.grant_experience(agent_id, amount).await
    }

    pub async fn record_command_success(&mut self, agent_id: &str, command: &str) -> Option<Agent> {
        let amount = self.rules.command_experience(command);
        tracing::trace!(agent = agent_id, command, amount, "Command success");
        self.grant_experience(agent_id, amount).await
    }

    /// Record a commit once; repeats of a persisted or staged commit are ignored
    pub async fn record_commit(
        &mut self,
        agent_id: &str,
        project_path: &str,
        commit_hash: &str,
        task: &str,
    ) -> Option<CommitData> {
        if !self.store.is_available() {
            return None;
        }
        if self.commit_known(project_path, commit_hash).await {
            tracing::debug!(
                project = project_path,
                commit = commit_hash,
                "Commit already recorded"
            );
            return None;
        }
        let mut agent = self.load_tracked_agent(agent_id).await?;

        let mut commit = CommitData::new(agent_id, project_path, commit_hash, task);
        commit.experience_gained = self.rules.commit_xp;
        self.buffer.buffer_commit(commit.clone());

        agent.total_commits += 1.0;
        self.stage_with_experience(agent, self.rules.commit_xp);
        Some(commit)
    }

    /// Append one grading of a commit and move CS by the grade value.
    ///
    /// An invalid grade is rejected before anything is staged.
    pub async fn record_communication_score(
        &mut self,
        agent_id: &str,
        project_path: &str,
        commit_hash: &str,
        grade: i64,
        reason: Option<String>,
    ) -> Result<Option<Agent>> {
        let grade = Grade::try_from(grade)?;
        if !self.store.is_available() {
            return Ok(None);
        }
        let Some(mut agent) = self.load_tracked_agent(agent_id).await else {
            return Ok(None);
        };

        self.buffer.buffer_communication_event(CommunicationScoreEvent {
            agent_id: agent.id.clone(),
            commit_hash: commit_hash.to_string(),
            project_path: project_path.to_string(),
            grade,
            timestamp: Utc::now(),
            reason,
        });

        agent.communication_score = apply_grades(agent.communication_score, &[grade]);
        agent.touch();
        self.buffer.buffer_agent(agent.clone());
        Ok(Some(agent))
    }

    /// Apply a combined agent and user review of a commit
    pub async fn record_commit_grade(
        &mut self,
        review: CommitReview,
    ) -> Result<Option<RetrospectiveEntry>> {
        let agent_grade = Grade::try_from(review.agent_grade)?;
        let user_grade = Grade::try_from(review.user_grade)?;
        if !self.store.is_available() {
            return Ok(None);
        }
        let Some(mut agent) = self.load_tracked_agent(&review.agent_id).await else {
            return Ok(None);
        };

        let score_before = agent.communication_score;
        agent.communication_score = apply_grades(score_before, &[agent_grade, user_grade]);

        let entry = RetrospectiveEntry {
            commit: review.commit_hash,
            timestamp: Utc::now(),
            task: review.task,
            agent_grade,
            user_grade,
            score_before,
            score_after: agent.communication_score,
            agent_note: review.agent_note,
            user_note: review.user_note,
        };
        self.buffer.buffer_retrospective(agent.id.clone(), entry.clone());

        self.stage_with_experience(agent, self.rules.commit_grade_xp);
        Ok(Some(entry))
    }

    /// Apply the bug penalty; a halt is announced exactly once
    pub async fn report_bug(&mut self, agent_id: &str) -> Option<BugReport> {
        if !self.store.is_available() {
            return None;
        }
        let mut agent = self.load_tracked_agent(agent_id).await?;

        let newly_halted = apply_bug(&mut agent, self.rules.bug_penalty);
        agent.touch();
        self.buffer.buffer_agent(agent.clone());

        if newly_halted {
            self.emit(ProgressEvent::Halted {
                agent_id: agent.id.clone(),
            });
        }
        Some(BugReport {
            agent,
            newly_halted,
        })
    }

    pub fn log_activity(&mut self, agent_id: &str, entry: ActivityEntry) -> bool {
        if !self.store.is_available() {
            return false;
        }
        self.buffer.buffer_activity(agent_id, entry);
        true
    }

    /// Status projection; staged intent wins over the stored row
    pub async fn get_agent_status(&self, agent_id: &str) -> Option<AgentStatus> {
        self.load_agent(agent_id).await.map(AgentStatus::from)
    }

    /// Flush everything staged during the session
    pub async fn finalize_session(&mut self) -> FlushResult {
        let result = self.push().await;
        if result.is_clean() {
            tracing::debug!(written = result.entries_written, "Session finalized");
        } else {
            tracing::warn!(
                written = result.entries_written,
                errors = ?result.errors,
                "Session finalized with write errors"
            );
        }
        result
    }

    /// Flush staged writes now
    pub async fn push(&mut self) -> FlushResult {
        self.buffer.flush(self.store.as_ref()).await
    }

    async fn load_agent(&self, agent_id: &str) -> Option<Agent> {
        if let Some(agent) = self.buffer.agent(agent_id) {
            return Some(agent.clone());
        }
        self.store.get_agent(agent_id).await
    }

    async fn load_tracked_agent(&self, agent_id: &str) -> Option<Agent> {
        let agent = self.load_agent(agent_id).await;
        if agent.is_none() {
            tracing::debug!(agent = agent_id, "Ignoring event for untracked agent");
        }
        agent
    }

    async fn commit_known(&self, project_path: &str, commit_hash: &str) -> bool {
        self.buffer.commit(project_path, commit_hash).is_some()
            || self
                .store
                .get_commit(project_path, commit_hash)
                .await
                .is_some()
    }

    async fn grant_experience(&mut self, agent_id: &str, amount: f64) -> Option<Agent> {
        if !self.store.is_available() {
            return None;
        }
        let agent = self.load_tracked_agent(agent_id).await?;
        Some(self.stage_with_experience(agent, amount))
    }

    fn stage_with_experience(&mut self, mut agent: Agent, amount: f64) -> Agent {
        let levels = apply_experience(&mut agent, amount, self.rules.level_multiplier);
        agent.touch();
        self.buffer.buffer_agent(agent.clone());

        if levels > 0 {
            self.emit(ProgressEvent::LevelUp {
                agent_id: agent.id.clone(),
                levels,
                skill_points: agent.skill_points,
            });
        }
        agent
    }

    fn emit(&self, event: ProgressEvent) {
        if let Err(e) = self.notifier.notify(&event) {
            tracing::warn!(
                agent = event.agent_id(),
                error = %e,
                "Failed to deliver progress event"
            );
        }
    }
}
