//! Configuration for the embedded progression store.

use agentrank_paths::{IN_MEMORY, StoreLocation, resolve_store_location};
use serde::{Deserialize, Serialize};

use crate::{ProgressError, Result};

/// Smallest accepted capacity limit (1 MiB)
pub const MIN_STORE_SIZE: u64 = 1024 * 1024;

/// Largest accepted capacity limit (2 GiB)
pub const MAX_STORE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Capacity limit used when none is configured (512 MiB)
pub const DEFAULT_STORE_SIZE: u64 = 512 * 1024 * 1024;

/// Configuration consumed when opening a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store location; relative paths resolve against home, `:memory:` selects the in-memory engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Capacity limit in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Requested block compression (engine-managed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<bool>,
}

impl StoreConfig {
    /// Config for a non-persistent store
    pub fn in_memory() -> Self {
        Self {
            path: Some(IN_MEMORY.to_string()),
            ..Self::default()
        }
    }

    /// Config for a store at the given path
    pub fn at(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_string_lossy().into_owned()),
            ..Self::default()
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Resolved store location
    pub fn location(&self) -> StoreLocation {
        resolve_store_location(self.path.as_deref())
    }

    /// Capacity limit, rejected (not clamped) outside 1 MiB..=2 GiB
    pub fn validated_max_size(&self) -> Result<u64> {
        let size = self.max_size.unwrap_or(DEFAULT_STORE_SIZE);
        if !(MIN_STORE_SIZE..=MAX_STORE_SIZE).contains(&size) {
            return Err(ProgressError::InvalidConfig(format!(
                "max_size {size} outside {MIN_STORE_SIZE}..={MAX_STORE_SIZE} bytes"
            )));
        }
        Ok(size)
    }

    pub fn compression_enabled(&self) -> bool {
        self.compression.unwrap_or(true)
    }
}
