use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use stepline_core::{
    EngineEvent, Filters, StepStatus, StepType, TimeRange, TimelineEngine, TimelineItem,
};

/// Either a bare array or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemSnapshot {
    Bare(Vec<TimelineItem>),
    Wrapped { items: Vec<TimelineItem> },
}

/// Read an item snapshot from a file, or stdin when `source` is `-`.
pub fn read_items(source: &str) -> Result<Vec<TimelineItem>> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read items from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read items at {source}"))?
    };

    let snapshot: ItemSnapshot = serde_json::from_str(&raw).with_context(|| {
        format!("Failed to parse items from {source}: expected a JSON array or {{\"items\": [...]}}")
    })?;
    Ok(match snapshot {
        ItemSnapshot::Bare(items) | ItemSnapshot::Wrapped { items } => items,
    })
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only items of this step type (`all` disables)
    #[arg(long)]
    pub step_type: Option<String>,

    /// Only items with this status (`all` disables)
    #[arg(long)]
    pub status: Option<String>,

    /// Case-insensitive substring of step name or type
    #[arg(long = "query", value_name = "QUERY")]
    pub text: Option<String>,

    /// Only bottleneck items
    #[arg(long)]
    pub bottlenecks: bool,

    /// Only AI items
    #[arg(long)]
    pub ai: bool,

    /// Only failed items
    #[arg(long)]
    pub errors: bool,

    /// Keep items intersecting [from, to] (RFC 3339)
    #[arg(long, requires = "to")]
    pub from: Option<DateTime<Utc>>,

    #[arg(long, requires = "from")]
    pub to: Option<DateTime<Utc>>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> Filters {
        Filters {
            step_type: self
                .step_type
                .as_deref()
                .filter(|raw| !is_all(raw))
                .map(StepType::from),
            step_status: self
                .status
                .as_deref()
                .filter(|raw| !is_all(raw))
                .map(StepStatus::from),
            search_query: self.text.clone().unwrap_or_default(),
            show_only_bottlenecks: self.bottlenecks,
            show_only_ai: self.ai,
            show_only_errors: self.errors,
            time_range: self.from.zip(self.to).map(|(start, end)| TimeRange { start, end }),
        }
    }
}

fn is_all(raw: &str) -> bool {
    raw.trim().is_empty() || raw.trim().eq_ignore_ascii_case("all")
}

/// Engine over the snapshot at `source` with the given filters applied.
pub fn load_engine(
    source: &str,
    filters: &FilterArgs,
    config_path: Option<&Path>,
) -> Result<TimelineEngine> {
    let config = crate::config_cmd::load(config_path)?;
    let items = read_items(source)?;
    let mut engine = TimelineEngine::from_items(items, config.engine_config())
        .with_context(|| format!("Failed to load timeline from {source}"))?;
    engine.apply(EngineEvent::SetFilters {
        filters: filters.to_filters(),
    })?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_disables_category_filters() {
        let args = FilterArgs {
            step_type: Some("ALL".to_string()),
            status: Some("failed".to_string()),
            ..FilterArgs::default()
        };
        let filters = args.to_filters();
        assert_eq!(filters.step_type, None);
        assert_eq!(filters.step_status, Some(StepStatus::Error));
        assert_eq!(filters.time_range, None);
    }

    #[test]
    fn wrapped_and_bare_snapshots_both_parse() {
        let dir = tempfile::tempdir().expect("tempdir");
        let item = r#"{"id":"a","stepId":"s","stepName":"n","stepType":"action","startTime":"2026-01-01T00:00:00Z","endTime":"2026-01-01T00:00:01Z"}"#;

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, format!("[{item}]")).expect("write");
        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, format!(r#"{{"items":[{item}]}}"#)).expect("write");

        for path in [bare, wrapped] {
            let items = read_items(path.to_str().expect("utf-8 path")).expect("read items");
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].id, "a");
        }
    }

    #[test]
    fn unreadable_snapshot_names_the_source() {
        let err = read_items("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
