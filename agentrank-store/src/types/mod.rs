//! Types for agentrank-store

mod agent;
mod bookkeeping;
mod grade;
mod records;

pub use agent::*;
pub use bookkeeping::*;
pub use grade::Grade;
pub use records::*;
