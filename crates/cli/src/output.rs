use anyhow::{Context, Result};
use serde::Serialize;
use stepline_core::markers::format_offset;
use stepline_core::{TimeScale, Timeline, TimelineItem};

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

/// One compact JSON document per line.
pub fn print_json_line<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

/// `lane  start..end  id  name [type/status]`
pub fn item_line(item: &TimelineItem, timeline: &Timeline, scale: TimeScale) -> String {
    let (start, end) = timeline.interval_of(item);
    let lane = item
        .lane
        .map(|lane| lane.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{lane:>4}  {:>10}..{:<10}  {}  {} [{}/{}]",
        format_offset(start, scale),
        format_offset(end, scale),
        item.id,
        item.step_name,
        item.step_type,
        item.status,
    )
}
