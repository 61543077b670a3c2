//! Storage contract and implementations for agentrank-store

mod cozo;
mod memory;
mod partition;
mod schema;
mod traits;

pub use cozo::CozoStore;
pub use memory::MemoryStore;
pub use partition::{
    Partition, RANGE_END, activity_key, commit_key, communication_key, owner_range,
    retrospective_key, sortable_timestamp,
};
pub use schema::{CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA, MIGRATIONS, Migration};
pub use traits::ProgressStore;
