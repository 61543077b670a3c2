//! Pure scoring and leveling rules
//!
//! Nothing here touches storage. The engine reads an agent, applies these
//! rules to a copy, and stages the result.

use std::collections::BTreeMap;

use agentrank_store::{Agent, COMMIT_EXPERIENCE, Grade, ProgressError, Result};
use serde::{Deserialize, Serialize};

/// XP needed per skill point to level up
pub const DEFAULT_LEVEL_MULTIPLIER: f64 = 10.0;

/// Tunable increments for every scoring event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// XP for a successful tool call
    pub tool_xp: f64,
    /// XP for a recorded commit
    pub commit_xp: f64,
    /// XP for a commit that went through combined grading
    pub commit_grade_xp: f64,
    /// SP lost per reported bug
    pub bug_penalty: f64,
    /// Level threshold is `level_multiplier * skill_points`
    pub level_multiplier: f64,
    /// XP for a command with no entry in `command_xp`
    pub default_command_xp: f64,
    /// Per-command XP overrides, keyed by command name
    pub command_xp: BTreeMap<String, f64>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            tool_xp: 1.0,
            commit_xp: COMMIT_EXPERIENCE,
            commit_grade_xp: 1.0,
            bug_penalty: 1.0,
            level_multiplier: DEFAULT_LEVEL_MULTIPLIER,
            default_command_xp: 1.0,
            command_xp: BTreeMap::new(),
        }
    }
}

impl ScoringRules {
    /// XP granted for a successful run of `command`
    pub fn command_experience(&self, command: &str) -> f64 {
        self.command_xp
            .get(command)
            .copied()
            .unwrap_or(self.default_command_xp)
    }

    /// Reject values that would stall leveling or invert penalties
    pub fn validate(&self) -> Result<()> {
        if self.level_multiplier.is_nan() || self.level_multiplier <= 0.0 {
            return Err(ProgressError::InvalidConfig(format!(
                "scoring.level_multiplier must be positive, got {}",
                self.level_multiplier
            )));
        }
        let increments = [
            ("tool_xp", self.tool_xp),
            ("commit_xp", self.commit_xp),
            ("commit_grade_xp", self.commit_grade_xp),
            ("bug_penalty", self.bug_penalty),
            ("default_command_xp", self.default_command_xp),
        ];
        for (name, value) in increments {
            if value.is_nan() || value < 0.0 {
                return Err(ProgressError::InvalidConfig(format!(
                    "scoring.{name} must not be negative, got {value}"
                )));
            }
        }
        for (command, value) in &self.command_xp {
            if value.is_nan() || *value < 0.0 {
                return Err(ProgressError::InvalidConfig(format!(
                    "scoring.command_xp.{command} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Add `amount` XP and level up while the threshold is met.
///
/// Each crossing subtracts `multiplier * SP` (computed before that crossing's
/// own SP increment) and keeps the remainder. Halted agents accrue XP but
/// never level. Returns the number of levels gained.
pub fn apply_experience(agent: &mut Agent, amount: f64, multiplier: f64) -> u32 {
    agent.experience_points += amount;

    let mut levels = 0;
    while agent.active && agent.skill_points > 0.0 {
        let threshold = multiplier * agent.skill_points;
        if threshold <= 0.0 || agent.experience_points < threshold {
            break;
        }
        agent.experience_points -= threshold;
        agent.skill_points += 1.0;
        levels += 1;
    }
    levels
}

/// Communication score after applying `grades`, floored at zero
pub fn apply_grades(score: f64, grades: &[Grade]) -> f64 {
    let delta: i64 = grades.iter().map(|g| g.value()).sum();
    (score + delta as f64).max(0.0)
}

/// Apply one bug report.
///
/// Returns true only when this call moved an active agent into the halted
/// state.
pub fn apply_bug(agent: &mut Agent, penalty: f64) -> bool {
    let was_active = agent.active;
    agent.skill_points = (agent.skill_points - penalty).max(0.0);
    agent.total_bugs += 1.0;
    if agent.skill_points <= 0.0 {
        agent.active = false;
    }
    was_active && !agent.active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(sp: f64, xp: f64) -> Agent {
        let mut agent = Agent::new("builder", "Builder", "sonnet", "backend");
        agent.skill_points = sp;
        agent.experience_points = xp;
        agent
    }

    #[test]
    fn test_levels_exactly_at_threshold() {
        let mut a = agent(3.0, 29.5);
        let levels = apply_experience(&mut a, 0.5, DEFAULT_LEVEL_MULTIPLIER);
        assert_eq!(levels, 1);
        assert_eq!(a.skill_points, 4.0);
        assert_eq!(a.experience_points, 0.0);
    }

    #[test]
    fn test_below_threshold_does_not_level() {
        let mut a = agent(2.0, 10.0);
        assert_eq!(apply_experience(&mut a, 9.0, DEFAULT_LEVEL_MULTIPLIER), 0);
        assert_eq!(a.skill_points, 2.0);
        assert_eq!(a.experience_points, 19.0);
    }

    #[test]
    fn test_remainder_is_kept() {
        let mut a = agent(1.0, 8.0);
        apply_experience(&mut a, 5.0, DEFAULT_LEVEL_MULTIPLIER);
        assert_eq!(a.skill_points, 2.0);
        assert_eq!(a.experience_points, 3.0);
    }

    #[test]
    fn test_large_grant_crosses_sequential_thresholds() {
        // 10 (SP 1) + 20 (SP 2) = 30, leaving 5 short of the SP 3 threshold
        let mut a = agent(1.0, 0.0);
        let levels = apply_experience(&mut a, 35.0, DEFAULT_LEVEL_MULTIPLIER);
        assert_eq!(levels, 2);
        assert_eq!(a.skill_points, 3.0);
        assert_eq!(a.experience_points, 5.0);
    }

    #[test]
    fn test_halted_agent_accrues_but_never_levels() {
        let mut a = agent(0.0, 0.0);
        a.active = false;
        assert_eq!(apply_experience(&mut a, 100.0, DEFAULT_LEVEL_MULTIPLIER), 0);
        assert_eq!(a.experience_points, 100.0);
        assert_eq!(a.skill_points, 0.0);
        assert!(!a.active);
    }

    #[test]
    fn test_grades_floor_at_zero() {
        assert_eq!(apply_grades(0.0, &[Grade::Bad]), 0.0);
        assert_eq!(apply_grades(1.0, &[Grade::Bad, Grade::Bad]), 0.0);
        assert_eq!(apply_grades(60.0, &[Grade::Good, Grade::Excellence]), 67.0);
    }

    #[test]
    fn test_combined_grades_range() {
        assert_eq!(apply_grades(10.0, &[Grade::Bad, Grade::Bad]), 8.0);
        assert_eq!(
            apply_grades(10.0, &[Grade::Excellence, Grade::Excellence]),
            20.0
        );
    }

    #[test]
    fn test_bug_halts_on_transition_only() {
        let mut a = agent(1.0, 0.0);
        assert!(apply_bug(&mut a, 1.0));
        assert_eq!(a.skill_points, 0.0);
        assert!(!a.active);
        assert_eq!(a.total_bugs, 1.0);

        assert!(!apply_bug(&mut a, 1.0));
        assert_eq!(a.skill_points, 0.0);
        assert_eq!(a.total_bugs, 2.0);
    }

    #[test]
    fn test_bug_above_zero_keeps_agent_active() {
        let mut a = agent(3.0, 0.0);
        assert!(!apply_bug(&mut a, 1.0));
        assert_eq!(a.skill_points, 2.0);
        assert!(a.active);
    }

    #[test]
    fn test_command_experience_falls_back_to_default() {
        let mut rules = ScoringRules::default();
        rules.command_xp.insert("deploy".into(), 3.0);
        assert_eq!(rules.command_experience("deploy"), 3.0);
        assert_eq!(rules.command_experience("lint"), 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let rules = ScoringRules {
            level_multiplier: 0.0,
            ..ScoringRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(ProgressError::InvalidConfig(_))
        ));
        assert!(ScoringRules::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_increment() {
        let mut rules = ScoringRules::default();
        rules.command_xp.insert("deploy".into(), -2.0);
        assert!(rules.validate().is_err());
    }
}
