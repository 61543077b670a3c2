use std::path::Path;

use agentrank_core::{ConfigLoader, STORE_PATH_ENV};
use agentrank_paths::{LEGACY_STORE_DIR, StoreLocation};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration and store paths
    Path,
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config_path),
        ConfigCommands::Path => show_paths(config_path),
    }
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths(config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    println!("User config:     {:?}", ConfigLoader::user_config_path());
    if let Some(path) = config_path {
        println!("Explicit config: {:?}", path);
    }
    match config.store.location() {
        StoreLocation::InMemory => println!("Store:           in-memory"),
        StoreLocation::Disk(path) => println!("Store:           {:?}", path),
    }
    println!("Legacy stores:   <project>/{LEGACY_STORE_DIR}");
    println!();
    println!("Set {STORE_PATH_ENV} to override the store location.");
    Ok(())
}
