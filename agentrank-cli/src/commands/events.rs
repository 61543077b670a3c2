use std::path::Path;

use agentrank_store::ProgressStore;
use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::open_store;

#[derive(Args)]
pub struct EventsArgs {
    /// Agent identifier
    pub agent: String,

    /// Maximum number of events to show
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

pub async fn run(args: EventsArgs, config_path: Option<&Path>) -> Result<()> {
    let (_, store) = open_store(config_path)?;
    let events = store.get_communication_events(&args.agent, args.limit).await;
    store.close().await;

    if events.is_empty() {
        println!("No grading events for '{}'.", args.agent);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Time").fg(Color::Cyan),
        Cell::new("Commit").fg(Color::Cyan),
        Cell::new("Project").fg(Color::Cyan),
        Cell::new("Grade").fg(Color::Cyan),
        Cell::new("Reason").fg(Color::Cyan),
    ]);

    for event in &events {
        let short_hash: String = event.commit_hash.chars().take(8).collect();
        table.add_row(vec![
            Cell::new(event.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(short_hash),
            Cell::new(&event.project_path),
            Cell::new(format!("{} ({})", event.grade, event.grade.value())),
            Cell::new(event.reason.as_deref().unwrap_or("")),
        ]);
    }

    println!("{table}");
    Ok(())
}
