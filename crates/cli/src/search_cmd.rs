use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use stepline_core::{EngineEvent, Viewport};

use crate::input::{FilterArgs, load_engine};
use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Item snapshot (JSON), `-` for stdin
    pub items: String,

    /// Case-insensitive substring of step name or type
    pub query: String,

    /// Advance the cursor this many matches; negative steps backwards
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub next: i64,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchReport<'a> {
    query: &'a str,
    matches: &'a [String],
    current_index: usize,
    current_id: Option<&'a str>,
    viewport: Viewport,
}

pub fn run(args: SearchArgs, config_path: Option<&Path>) -> Result<()> {
    let mut engine = load_engine(&args.items, &args.filters, config_path)?;
    engine.apply(EngineEvent::Search {
        query: args.query.clone(),
    })?;

    let step = if args.next < 0 {
        EngineEvent::SearchPrevious
    } else {
        EngineEvent::SearchNext
    };
    for _ in 0..args.next.unsigned_abs() {
        engine.apply(step.clone())?;
    }

    let search = engine.search();
    match args.format {
        OutputFormat::Json => print_json(&SearchReport {
            query: &args.query,
            matches: search.matches(),
            current_index: search.current_index(),
            current_id: search.current(),
            viewport: engine.viewport(),
        }),
        OutputFormat::Text => {
            if !search.is_active() {
                println!("no matches for {:?}", args.query);
                return Ok(());
            }
            for (index, id) in search.matches().iter().enumerate() {
                let marker = if index == search.current_index() { '>' } else { ' ' };
                println!("{marker} {}/{}  {id}", index + 1, search.matches().len());
            }
            Ok(())
        }
    }
}
