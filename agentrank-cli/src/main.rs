use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "agentrank", about = "Inspect and maintain agent progression data")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file layered over the user config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one agent's progression status
    Status(commands::status::StatusArgs),
    /// List tracked agents
    Agents(commands::agents::AgentsArgs),
    /// Show communication grading events for an agent
    Events(commands::events::EventsArgs),
    /// Migrate a project's legacy store into the central store
    Migrate(commands::migrate::MigrateArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Status(args) => commands::status::run(args, config).await,
        Commands::Agents(args) => commands::agents::run(args, config).await,
        Commands::Events(args) => commands::events::run(args, config).await,
        Commands::Migrate(args) => commands::migrate::run(args, config).await,
        Commands::Config(args) => commands::config::run(args, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_with_global_flags() {
        let cli =
            Cli::try_parse_from(["agentrank", "status", "builder", "--json", "-v", "-c", "x.toml"])
                .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.agent, "builder");
                assert!(args.json);
            }
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn parse_list_limits() {
        let cli = Cli::try_parse_from(["agentrank", "agents"]).unwrap();
        match cli.command {
            Commands::Agents(args) => assert_eq!(args.limit, 50),
            _ => panic!("expected agents"),
        }

        let cli = Cli::try_parse_from(["agentrank", "events", "builder", "--limit", "5"]).unwrap();
        match cli.command {
            Commands::Events(args) => {
                assert_eq!(args.agent, "builder");
                assert_eq!(args.limit, 5);
            }
            _ => panic!("expected events"),
        }
    }

    #[test]
    fn parse_migrate_requires_project_dir() {
        assert!(Cli::try_parse_from(["agentrank", "migrate"]).is_err());
        let cli = Cli::try_parse_from(["agentrank", "migrate", "/work/app"]).unwrap();
        match cli.command {
            Commands::Migrate(args) => assert_eq!(args.project_dir, PathBuf::from("/work/app")),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
