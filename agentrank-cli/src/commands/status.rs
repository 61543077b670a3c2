use std::path::Path;
use std::sync::Arc;

use agentrank_core::ScoringEngine;
use agentrank_store::{ProgressStore, WriteBuffer};
use anyhow::{Result, bail};
use clap::Args;

use super::{format_score, open_store};

#[derive(Args)]
pub struct StatusArgs {
    /// Agent identifier
    pub agent: String,

    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatusArgs, config_path: Option<&Path>) -> Result<()> {
    let (config, store) = open_store(config_path)?;
    let store: Arc<dyn ProgressStore> = Arc::new(store);
    let multiplier = config.scoring.level_multiplier;
    let engine = ScoringEngine::new(store.clone(), WriteBuffer::new(), config.scoring);

    let status = engine.get_agent_status(&args.agent).await;
    store.close().await;

    let Some(status) = status else {
        bail!("Agent '{}' is not tracked", args.agent);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let agent = &status.agent;
    let next_level = multiplier * agent.skill_points;
    println!("Agent:          {} ({})", agent.id, agent.name);
    println!("Model:          {}", agent.model);
    println!("Scope:          {}", agent.scope);
    println!(
        "Status:         {}",
        if status.halted { "HALTED" } else { "active" }
    );
    println!();
    println!("Skill points:   {}", format_score(agent.skill_points));
    if status.halted {
        println!("Experience:     {}", format_score(agent.experience_points));
    } else {
        println!(
            "Experience:     {} / {}",
            format_score(agent.experience_points),
            format_score(next_level)
        );
    }
    println!("Communication:  {}", format_score(agent.communication_score));
    println!("Commits:        {}", format_score(agent.total_commits));
    println!("Bugs:           {}", format_score(agent.total_bugs));
    println!();
    println!("Tracked since:  {}", agent.created_at.format("%Y-%m-%d %H:%M"));
    println!("Last updated:   {}", agent.updated_at.format("%Y-%m-%d %H:%M"));

    if status.halted {
        println!();
        println!("This agent is halted: skill points reached zero after bug reports.");
    }
    Ok(())
}
