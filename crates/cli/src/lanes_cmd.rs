use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use stepline_core::TimelineItem;

use crate::input::{FilterArgs, load_engine};
use crate::output::{OutputFormat, item_line, print_json};

#[derive(Debug, Clone, Args)]
pub struct LanesArgs {
    /// Item snapshot (JSON), `-` for stdin
    pub items: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LanesReport<'a> {
    lane_count: usize,
    items: &'a [TimelineItem],
}

pub fn run(args: LanesArgs, config_path: Option<&Path>) -> Result<()> {
    let engine = load_engine(&args.items, &args.filters, config_path)?;

    match args.format {
        OutputFormat::Json => print_json(&LanesReport {
            lane_count: engine.lane_count(),
            items: engine.items(),
        }),
        OutputFormat::Text => {
            println!(
                "{} items in {} lanes ({} hidden by filters)",
                engine.items().len(),
                engine.lane_count(),
                engine.all_items().len() - engine.items().len(),
            );
            for item in engine.items() {
                println!("{}", item_line(item, engine.timeline(), engine.scale()));
            }
            Ok(())
        }
    }
}
