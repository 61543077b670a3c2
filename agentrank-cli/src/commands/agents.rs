use std::path::Path;

use agentrank_store::ProgressStore;
use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::{format_score, open_store};

#[derive(Args)]
pub struct AgentsArgs {
    /// Maximum number of agents to list
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

pub async fn run(args: AgentsArgs, config_path: Option<&Path>) -> Result<()> {
    let (_, store) = open_store(config_path)?;
    let agents = store.get_all_agents(args.limit).await;
    store.close().await;

    if agents.is_empty() {
        println!("No agents tracked yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Agent").fg(Color::Cyan),
        Cell::new("Model").fg(Color::Cyan),
        Cell::new("Scope").fg(Color::Cyan),
        Cell::new("SP").fg(Color::Cyan),
        Cell::new("XP").fg(Color::Cyan),
        Cell::new("CS").fg(Color::Cyan),
        Cell::new("Commits").fg(Color::Cyan),
        Cell::new("Bugs").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for agent in &agents {
        let status = if agent.is_halted() {
            Cell::new("halted").fg(Color::Red)
        } else {
            Cell::new("active").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&agent.id),
            Cell::new(&agent.model),
            Cell::new(&agent.scope),
            Cell::new(format_score(agent.skill_points)),
            Cell::new(format_score(agent.experience_points)),
            Cell::new(format_score(agent.communication_score)),
            Cell::new(format_score(agent.total_commits)),
            Cell::new(format_score(agent.total_bugs)),
            status,
        ]);
    }

    println!("{table}");
    Ok(())
}
