//! One-time migration from per-project legacy stores
//!
//! A legacy store keeps agents, commits and grading events in a single flat
//! relation, telling them apart by key prefix:
//!
//! | Prefix | Key shape | Target partition |
//! |--------|-----------|------------------|
//! | `agent:` | `agent:<id>` | agents |
//! | `commit:` | `commit:<project>:<hash>` | commits |
//! | `communication:` | `communication:<id>` | communication |
//!
//! Migration is idempotent: a `MigrationRecord` written at the end marks the
//! source as done, and agents or commits already present in the target are
//! left untouched.

mod legacy;

pub use legacy::LegacyStore;

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::store::ProgressStore;
use crate::{
    Agent, CommitData, CommunicationScoreEvent, MigrationRecord, ProgressError, Result,
};

/// A legacy key, parsed once and routed exhaustively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKey<'a> {
    Agent { id: &'a str },
    Commit { project_path: &'a str, commit_hash: &'a str },
    Communication { id: &'a str },
    Unknown { key: &'a str },
}

impl<'a> LegacyKey<'a> {
    /// Parse a raw legacy key.
    ///
    /// Commit keys split on the first `:` after the prefix, so the hash keeps
    /// any later colons. A commit key with an empty part is malformed.
    pub fn parse(key: &'a str) -> Result<Self> {
        if let Some(id) = key.strip_prefix("agent:") {
            return Ok(Self::Agent { id });
        }
        if let Some(rest) = key.strip_prefix("commit:") {
            return match rest.split_once(':') {
                Some((project_path, commit_hash))
                    if !project_path.is_empty() && !commit_hash.is_empty() =>
                {
                    Ok(Self::Commit {
                        project_path,
                        commit_hash,
                    })
                }
                _ => Err(ProgressError::LegacyKey(key.to_string())),
            };
        }
        if let Some(id) = key.strip_prefix("communication:") {
            return Ok(Self::Communication { id });
        }
        Ok(Self::Unknown { key })
    }
}

/// Outcome of migrating one legacy source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    pub source_path: PathBuf,
    pub entries_migrated: u64,
    pub entries_skipped: u64,
    pub errors: Vec<String>,
    pub already_migrated: bool,
}

impl MigrationResult {
    fn new(source_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

enum Outcome {
    Migrated,
    Skipped,
}

/// Migrate the legacy store of `project_dir` into `target`
pub async fn migrate_project(target: &dyn ProgressStore, project_dir: &Path) -> MigrationResult {
    let source = agentrank_paths::legacy_store_path(project_dir);
    migrate_legacy_store(target, &source).await
}

/// Migrate the legacy store at `source` into `target`
pub async fn migrate_legacy_store(target: &dyn ProgressStore, source: &Path) -> MigrationResult {
    let mut result = MigrationResult::new(source);
    let source_key = source.to_string_lossy().into_owned();

    if !target.is_available() {
        result
            .errors
            .push(format!("{}: target store unavailable", source.display()));
        return result;
    }

    if let Some(record) = target.get_migration_record(&source_key).await {
        tracing::debug!(source = %source.display(), "Legacy store already migrated");
        result.already_migrated = true;
        result.entries_skipped = record.entries_migrated;
        return result;
    }

    if !source.exists() {
        return result;
    }

    let entries = match read_legacy_entries(source) {
        Ok(entries) => entries,
        Err(e) => {
            result.errors.push(format!("{}: {e}", source.display()));
            return result;
        }
    };

    for (key, value) in &entries {
        match route_entry(target, key, value).await {
            Ok(Outcome::Migrated) => result.entries_migrated += 1,
            Ok(Outcome::Skipped) => result.entries_skipped += 1,
            Err(e) => result.errors.push(format!("{key}: {e}")),
        }
    }

    let record = MigrationRecord {
        source_path: source_key,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        entries_migrated: result.entries_migrated,
    };
    if !target.put_migration_record(&record).await {
        // Source stays so a rerun can retry
        result.errors.push(format!(
            "{}: failed to write migration record",
            source.display()
        ));
    } else if let Err(e) = std::fs::remove_dir_all(source) {
        result.errors.push(format!(
            "{}: failed to remove legacy store: {e}",
            source.display()
        ));
    }

    tracing::info!(
        source = %source.display(),
        migrated = result.entries_migrated,
        skipped = result.entries_skipped,
        errors = result.errors.len(),
        "Migrated legacy store"
    );
    result
}

/// Read every legacy row and release the database before anything else runs
fn read_legacy_entries(source: &Path) -> Result<Vec<(String, String)>> {
    let legacy = LegacyStore::open(source)?;
    legacy.entries()
}

async fn route_entry(target: &dyn ProgressStore, key: &str, value: &str) -> Result<Outcome> {
    match LegacyKey::parse(key)? {
        LegacyKey::Agent { id } => {
            if target.get_agent(id).await.is_some() {
                return Ok(Outcome::Skipped);
            }
            let mut agent: Agent = serde_json::from_str(value)?;
            agent.id = id.to_string();
            written(target.put_agent(&agent).await)
        }
        LegacyKey::Commit {
            project_path,
            commit_hash,
        } => {
            if target.get_commit(project_path, commit_hash).await.is_some() {
                return Ok(Outcome::Skipped);
            }
            let mut commit: CommitData = serde_json::from_str(value)?;
            commit.project_path = project_path.to_string();
            commit.commit_hash = commit_hash.to_string();
            written(target.put_commit(&commit).await)
        }
        LegacyKey::Communication { id } => {
            let event: CommunicationScoreEvent = serde_json::from_str(value)?;
            let ordinal = format!("{:016}-{id}", event.timestamp.timestamp_micros());
            written(target.put_communication_event(&ordinal, &event).await)
        }
        LegacyKey::Unknown { key } => Err(ProgressError::Migration(format!(
            "unknown key prefix in {key}"
        ))),
    }
}

fn written(ok: bool) -> Result<Outcome> {
    if ok {
        Ok(Outcome::Migrated)
    } else {
        Err(ProgressError::Database("write rejected by target".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent_key() {
        assert_eq!(
            LegacyKey::parse("agent:builder").unwrap(),
            LegacyKey::Agent { id: "builder" }
        );
    }

    #[test]
    fn test_parse_commit_key_splits_on_first_colon() {
        assert_eq!(
            LegacyKey::parse("commit:/work/app:abc:def").unwrap(),
            LegacyKey::Commit {
                project_path: "/work/app",
                commit_hash: "abc:def",
            }
        );
    }

    #[test]
    fn test_parse_malformed_commit_key() {
        for key in ["commit:abc123", "commit:/work/app:", "commit::abc"] {
            assert!(
                matches!(LegacyKey::parse(key), Err(ProgressError::LegacyKey(_))),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_communication_key() {
        assert_eq!(
            LegacyKey::parse("communication:17").unwrap(),
            LegacyKey::Communication { id: "17" }
        );
    }

    #[test]
    fn test_parse_unknown_prefix() {
        assert_eq!(
            LegacyKey::parse("session:xyz").unwrap(),
            LegacyKey::Unknown { key: "session:xyz" }
        );
    }
}
