//! Migration bookkeeping and project profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marks a legacy source as fully migrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub source_path: String,
    /// Version of the tool that ran the migration
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub entries_migrated: u64,
}

/// Classification of a project, written by the project classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub project_path: String,
    pub name: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
