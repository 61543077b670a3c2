//! agentrank-core - Agent progression scoring
//!
//! Pure scoring rules, the `ScoringEngine` that stages progression changes
//! through a `WriteBuffer`, the notification seam for level-ups and halts,
//! and layered configuration.

pub mod config;
pub mod engine;
pub mod notify;
pub mod rules;

pub use config::{ConfigLoader, ProgressConfig, STORE_PATH_ENV};
pub use engine::{BugReport, CommitReview, ScoringEngine, SessionInfo};
pub use notify::{Notifier, ProgressEvent, TracingNotifier};
pub use rules::{DEFAULT_LEVEL_MULTIPLIER, ScoringRules, apply_bug, apply_experience, apply_grades};
