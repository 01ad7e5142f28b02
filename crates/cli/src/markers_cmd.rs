use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use stepline_core::{TimeMarker, TimeScale, generate_markers_capped};

use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Args)]
pub struct MarkersArgs {
    /// Total timeline duration in milliseconds
    #[arg(long)]
    pub total_ms: f64,

    /// Viewport start in ms (default 0)
    #[arg(long)]
    pub start: Option<f64>,

    /// Viewport end in ms (default: total)
    #[arg(long)]
    pub end: Option<f64>,

    /// Preferred scale: second, ten_seconds, minute, five_minutes, hour
    #[arg(long)]
    pub scale: Option<TimeScale>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkersReport {
    scale: TimeScale,
    step_ms: f64,
    markers: Vec<TimeMarker>,
}

pub fn run(args: MarkersArgs, config_path: Option<&Path>) -> Result<()> {
    let config = crate::config_cmd::load(config_path)?;
    let scale = args.scale.unwrap_or(config.markers.default_scale);
    let markers = generate_markers_capped(
        args.total_ms,
        scale,
        args.start.unwrap_or(0.0),
        args.end.unwrap_or(args.total_ms),
        config.markers.density_cap,
    )
    .context("Failed to generate markers")?;

    match args.format {
        OutputFormat::Json => print_json(&MarkersReport {
            scale: markers.scale(),
            step_ms: markers.step_ms(),
            markers: markers.iter().collect(),
        }),
        OutputFormat::Text => {
            if markers.scale() != scale {
                println!("# scale coarsened to {}", markers.scale());
            }
            for marker in &markers {
                println!("{:>7.2}%  {}", marker.position, marker.label);
            }
            Ok(())
        }
    }
}
