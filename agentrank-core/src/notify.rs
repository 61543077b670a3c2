//! Progression events surfaced to the host

use agentrank_store::{AgentId, Result};

/// A state transition the user should hear about
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// XP crossed one or more level thresholds
    LevelUp {
        agent_id: AgentId,
        levels: u32,
        skill_points: f64,
    },
    /// A bug report drove skill points to zero
    Halted { agent_id: AgentId },
}

impl ProgressEvent {
    pub fn agent_id(&self) -> &str {
        match self {
            Self::LevelUp { agent_id, .. } | Self::Halted { agent_id } => agent_id,
        }
    }
}

/// Delivery of progression events, fire-and-forget
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &ProgressEvent) -> Result<()>;
}

/// Writes progression events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: &ProgressEvent) -> Result<()> {
        match event {
            ProgressEvent::LevelUp {
                agent_id,
                levels,
                skill_points,
            } => {
                tracing::info!(agent = %agent_id, levels, skill_points, "Agent leveled up");
            }
            ProgressEvent::Halted { agent_id } => {
                tracing::warn!(agent = %agent_id, "Agent halted: skill points exhausted");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_for_every_event() {
        let level_up = ProgressEvent::LevelUp {
            agent_id: "builder".into(),
            levels: 1,
            skill_points: 2.0,
        };
        let halted = ProgressEvent::Halted {
            agent_id: "reviewer".into(),
        };
        assert_eq!(level_up.agent_id(), "builder");
        assert_eq!(halted.agent_id(), "reviewer");
    }

    #[test]
    fn test_tracing_notifier_never_fails() {
        let event = ProgressEvent::Halted {
            agent_id: "builder".into(),
        };
        assert!(TracingNotifier.notify(&event).is_ok());
    }

    #[test]
    fn test_notifier_is_object_safe() {
        fn _takes_boxed(_: Box<dyn Notifier>) {}
    }
}
