//! CozoDB schema definitions for the progression store
//!
//! Each partition is its own stored relation holding `key => value` rows,
//! where the value is the JSON encoding of one record. Schema changes are
//! additive and applied in version order.

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Initial schema: version bookkeeping plus the five core partitions
pub const INITIAL_SCHEMA: &str = r#"
{
    :create schema_version {
        version: Int =>
        applied_at: Int,
        description: String
    }
}
{
    :create agents {
        key: String =>
        value: String
    }
}
{
    :create commits {
        key: String =>
        value: String
    }
}
{
    :create communication {
        key: String =>
        value: String
    }
}
{
    :create retrospectives {
        key: String =>
        value: String
    }
}
{
    :create activities {
        key: String =>
        value: String
    }
}
"#;

/// Migration bookkeeping and project profile partitions (v2)
pub const BOOKKEEPING_SCHEMA: &str = r#"
{
    :create migrations {
        key: String =>
        value: String
    }
}
{
    :create projects {
        key: String =>
        value: String
    }
}
"#;

/// Schema migration definition
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number for this migration
    pub version: u32,
    /// Human-readable description of what this migration does
    pub description: &'static str,
    /// The Datalog script to execute for this migration
    pub script: &'static str,
}

/// All migrations in order
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        script: INITIAL_SCHEMA,
    },
    Migration {
        version: 2,
        description: "Migration bookkeeping and project profiles",
        script: BOOKKEEPING_SCHEMA,
    },
];

/// Flat single-relation layout used by per-project legacy stores
pub const LEGACY_SCHEMA: &str = r#"
{
    :create entries {
        key: String =>
        value: String
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Partition;

    #[test]
    fn test_schema_version_constant() {
        assert_eq!(CURRENT_SCHEMA_VERSION, 2);
    }

    #[test]
    fn test_migrations_are_ordered() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, i as u32 + 1);
        }
        assert_eq!(
            MIGRATIONS.last().map(|m| m.version),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_every_partition_has_a_relation() {
        let all_scripts: String = MIGRATIONS.iter().map(|m| m.script).collect();
        for partition in Partition::ALL {
            let create = format!(":create {} {{", partition.as_str());
            assert!(
                all_scripts.contains(&create),
                "missing relation for {partition}"
            );
        }
    }
}
