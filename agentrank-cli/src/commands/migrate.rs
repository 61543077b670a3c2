use std::path::{Path, PathBuf};

use agentrank_store::{ProgressStore, migrate_project};
use anyhow::{Result, bail};
use clap::Args;

use super::open_store;

#[derive(Args)]
pub struct MigrateArgs {
    /// Project directory containing a legacy store
    pub project_dir: PathBuf,
}

pub async fn run(args: MigrateArgs, config_path: Option<&Path>) -> Result<()> {
    let (_, store) = open_store(config_path)?;
    let result = migrate_project(&store, &args.project_dir).await;
    store.close().await;

    println!("Source:    {}", result.source_path.display());
    if result.already_migrated {
        println!(
            "Already migrated ({} entries previously moved).",
            result.entries_skipped
        );
        return Ok(());
    }
    if result.entries_migrated == 0 && result.entries_skipped == 0 && result.is_clean() {
        println!("No legacy store found.");
        return Ok(());
    }

    println!("Migrated:  {}", result.entries_migrated);
    println!("Skipped:   {}", result.entries_skipped);

    if !result.is_clean() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            println!("  - {error}");
        }
        bail!("Migration finished with {} error(s)", result.errors.len());
    }
    Ok(())
}
