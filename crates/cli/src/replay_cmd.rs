use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use stepline_core::{EngineEvent, TimelineEngine};

use crate::input::read_items;
use crate::output::print_json_line;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Item snapshot (JSON), `-` for stdin
    pub items: String,

    /// JSONL file with one engine event per line
    pub events: PathBuf,
}

pub fn run(args: ReplayArgs, config_path: Option<&Path>) -> Result<()> {
    let config = crate::config_cmd::load(config_path)?;
    let items = read_items(&args.items)?;
    let mut engine = TimelineEngine::from_items(items, config.engine_config())
        .with_context(|| format!("Failed to load timeline from {}", args.items))?;

    let content = std::fs::read_to_string(&args.events)
        .with_context(|| format!("Failed to read events at {}", args.events.display()))?;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;
        let event: EngineEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {line_no}"))?;
        let outputs = engine
            .apply(event)
            .with_context(|| format!("Event on line {line_no} was rejected"))?;
        for output in &outputs {
            print_json_line(output)?;
        }
    }

    print_json_line(&engine.snapshot())
}
