pub mod agents;
pub mod config;
pub mod events;
pub mod migrate;
pub mod status;

use std::path::Path;

use agentrank_core::{ConfigLoader, ProgressConfig};
use agentrank_store::{CozoStore, ProgressStore};
use anyhow::{Context, Result, bail};

/// Load the layered config and open the central store.
///
/// Unlike a host session, the CLI fails when the store is unavailable.
pub(crate) fn open_store(config_path: Option<&Path>) -> Result<(ProgressConfig, CozoStore)> {
    let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    tracing::debug!(store = ?config.store, "Loaded configuration");
    let store = CozoStore::open(&config.store);
    if !store.is_available() {
        bail!(
            "Progress store at {:?} is unavailable (run with --verbose for details)",
            store.location()
        );
    }
    Ok((config, store))
}

/// Render a score without a trailing `.0` for whole numbers
pub(crate) fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
