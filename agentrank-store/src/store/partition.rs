//! Sub-store names and key layout
//!
//! Every entity kind lives in its own partition, so a scan of one kind never
//! touches another kind's rows. Composite keys join their parts with `:` and
//! per-agent range reads use the half-open range `[id:, id:~)`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Sorts after every character used in normal keys
pub const RANGE_END: char = '~';

/// Named sub-store of the root store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    Agents,
    Commits,
    Communication,
    Retrospectives,
    Activities,
    Migrations,
    Projects,
}

impl Partition {
    pub const ALL: [Partition; 7] = [
        Self::Agents,
        Self::Commits,
        Self::Communication,
        Self::Retrospectives,
        Self::Activities,
        Self::Migrations,
        Self::Projects,
    ];

    /// Relation name on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Commits => "commits",
            Self::Communication => "communication",
            Self::Retrospectives => "retrospectives",
            Self::Activities => "activities",
            Self::Migrations => "migrations",
            Self::Projects => "projects",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn commit_key(project_path: &str, commit_hash: &str) -> String {
    format!("{project_path}:{commit_hash}")
}

pub fn communication_key(agent_id: &str, commit_hash: &str, ordinal: &str) -> String {
    format!("{agent_id}:{commit_hash}:{ordinal}")
}

pub fn retrospective_key(agent_id: &str, commit_hash: &str) -> String {
    format!("{agent_id}:{commit_hash}")
}

pub fn activity_key(agent_id: &str, timestamp: &DateTime<Utc>) -> String {
    format!("{agent_id}:{}", sortable_timestamp(timestamp))
}

/// Fixed-width RFC 3339 timestamp, so lexical order matches time order
pub fn sortable_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Half-open key range covering every row owned by `owner`
pub fn owner_range(owner: &str) -> (String, String) {
    (format!("{owner}:"), format!("{owner}:{RANGE_END}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_partition_names_are_unique() {
        let mut names: Vec<_> = Partition::ALL.iter().map(|p| p.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Partition::ALL.len());
    }

    #[test]
    fn test_owner_range_contains_owned_keys_only() {
        let (start, end) = owner_range("builder");
        let owned = communication_key("builder", "abc123", "0001");
        let other = communication_key("builder-2", "abc123", "0001");
        assert!(owned >= start && owned < end);
        assert!(!(other >= start && other < end));
    }

    #[test]
    fn test_activity_keys_sort_by_time() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 11, 2, 3, 4, 5).unwrap();
        assert!(activity_key("a", &early) < activity_key("a", &late));
    }

    #[test]
    fn test_commit_key_layout() {
        assert_eq!(commit_key("/work/app", "abc123"), "/work/app:abc123");
    }
}
