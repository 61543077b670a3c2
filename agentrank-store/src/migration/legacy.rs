//! Per-project legacy store
//!
//! Older installs kept every record in one flat relation inside the project,
//! distinguishing kinds by a string prefix on the key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cozo::{DataValue, DbInstance, ScriptMutability};

use crate::store::LEGACY_SCHEMA;
use crate::{ProgressError, Result};

/// Flat single-relation store with prefixed keys
pub struct LegacyStore {
    db: DbInstance,
    path: PathBuf,
}

impl LegacyStore {
    /// Open an existing legacy store
    pub fn open(path: &Path) -> Result<Self> {
        let db = DbInstance::new("rocksdb", path, "").map_err(|e| {
            ProgressError::Migration(format!("Failed to open legacy store: {e}"))
        })?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Create a legacy store with its relation, for fixtures and tooling
    pub fn create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let store = Self::open(path)?;
        store
            .db
            .run_script(LEGACY_SCHEMA, BTreeMap::new(), ScriptMutability::Mutable)
            .map_err(|e| ProgressError::Migration(format!("Legacy schema init failed: {e}")))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert(&self, key: &str, value: &str) -> Result<()> {
        let mut params = BTreeMap::new();
        params.insert("key".to_string(), DataValue::from(key));
        params.insert("value".to_string(), DataValue::from(value));
        self.db
            .run_script(
                r#"?[key, value] <- [[$key, $value]]
                :put entries { key => value }"#,
                params,
                ScriptMutability::Mutable,
            )
            .map_err(|e| ProgressError::Migration(format!("Legacy write failed: {e}")))?;
        Ok(())
    }

    /// Every row, in key order
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let rows = self
            .db
            .run_script(
                "?[key, value] := *entries{key, value}",
                BTreeMap::new(),
                ScriptMutability::Immutable,
            )
            .map_err(|e| ProgressError::Migration(format!("Legacy scan failed: {e}")))?;

        rows.rows
            .iter()
            .map(|row| {
                let key = row.first().and_then(|v| v.get_str());
                let value = row.get(1).and_then(|v| v.get_str());
                match (key, value) {
                    (Some(k), Some(v)) => Ok((k.to_string(), v.to_string())),
                    _ => Err(ProgressError::Migration("Invalid legacy row".into())),
                }
            })
            .collect()
    }
}
