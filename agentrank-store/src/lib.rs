//! agentrank-store - Progression records and persistence
//!
//! This crate holds the typed records of the agent progression model
//! (agents, commits, grading events, retrospectives, activities), the
//! `ProgressStore` contract with its CozoDB and in-memory backends, the
//! `WriteBuffer` used to batch writes, and the one-time migration from
//! per-project legacy stores.

pub mod buffer;
pub mod config;
pub mod error;
pub mod migration;
pub mod store;
pub mod types;

pub use buffer::{BufferedWrite, FlushResult, WriteBuffer};
pub use config::{DEFAULT_STORE_SIZE, MAX_STORE_SIZE, MIN_STORE_SIZE, StoreConfig};
pub use error::{ProgressError, Result};
pub use migration::{
    LegacyKey, LegacyStore, MigrationResult, migrate_legacy_store, migrate_project,
};
pub use store::{CURRENT_SCHEMA_VERSION, CozoStore, MemoryStore, Partition, ProgressStore};
pub use types::*;
