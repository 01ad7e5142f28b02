use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use stepline_core::EngineEvent;

use crate::input::{FilterArgs, load_engine};
use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Args)]
pub struct RelatedArgs {
    /// Item snapshot (JSON), `-` for stdin
    pub items: String,

    /// Focus item id
    pub id: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelatedReport<'a> {
    focus_id: &'a str,
    related: &'a BTreeSet<String>,
}

pub fn run(args: RelatedArgs, config_path: Option<&Path>) -> Result<()> {
    let mut engine = load_engine(&args.items, &args.filters, config_path)?;
    engine.apply(EngineEvent::Select {
        id: args.id.clone(),
    })?;

    match args.format {
        OutputFormat::Json => print_json(&RelatedReport {
            focus_id: &args.id,
            related: engine.related(),
        }),
        OutputFormat::Text => {
            if engine.related().is_empty() {
                println!("{} is not a visible item", args.id);
            }
            for id in engine.related() {
                let marker = if *id == args.id { '*' } else { ' ' };
                println!("{marker} {id}");
            }
            Ok(())
        }
    }
}
