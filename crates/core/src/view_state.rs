//! Caller-persistable view state.
//!
//! Everything the engine owns besides the item snapshot can be encoded as
//! URL query parameters and restored later. Decoding is lenient: unknown
//! keys are ignored and malformed values fall back to defaults.

use crate::filter::{Filters, TimeRange};
use crate::item::{StepStatus, StepType};
use crate::markers::TimeScale;
use crate::viewport::Viewport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    pub scale: TimeScale,
    pub filters: Filters,
    pub search_query: String,
    pub search_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl ViewState {
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(viewport) = self.viewport {
            pairs.push(("start", viewport.start.to_string()));
            pairs.push(("end", viewport.end.to_string()));
        }
        if self.scale != TimeScale::default() {
            pairs.push(("scale", self.scale.to_string()));
        }
        if let Some(step_type) = &self.filters.step_type {
            pairs.push(("type", step_type.to_string()));
        }
        if let Some(status) = &self.filters.step_status {
            pairs.push(("status", status.to_string()));
        }
        if !self.filters.search_query.is_empty() {
            pairs.push(("q", self.filters.search_query.clone()));
        }
        for (key, on) in [
            ("bottlenecks", self.filters.show_only_bottlenecks),
            ("ai", self.filters.show_only_ai),
            ("errors", self.filters.show_only_errors),
        ] {
            if on {
                pairs.push((key, "1".to_string()));
            }
        }
        if let Some(range) = self.filters.time_range {
            pairs.push(("from", range.start.to_rfc3339()));
            pairs.push(("to", range.end.to_rfc3339()));
        }
        if !self.search_query.is_empty() {
            pairs.push(("find", self.search_query.clone()));
            if self.search_index > 0 {
                pairs.push(("match", self.search_index.to_string()));
            }
        }
        if let Some(selected) = &self.selected {
            pairs.push(("sel", selected.clone()));
        }

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn from_query_string(query: &str) -> Self {
        let mut state = Self::default();
        let mut start: Option<f64> = None;
        let mut end: Option<f64> = None;
        let mut from: Option<DateTime<Utc>> = None;
        let mut to: Option<DateTime<Utc>> = None;

        for (key, value) in parse_pairs(query) {
            match key.as_str() {
                "start" => start = value.parse().ok().filter(|v: &f64| v.is_finite()),
                "end" => end = value.parse().ok().filter(|v: &f64| v.is_finite()),
                "scale" => state.scale = value.parse().unwrap_or_default(),
                "type" if !value.eq_ignore_ascii_case("all") => {
                    state.filters.step_type = Some(StepType::from(value));
                }
                "status" if !value.eq_ignore_ascii_case("all") => {
                    state.filters.step_status = Some(StepStatus::from(value));
                }
                "q" => state.filters.search_query = value,
                "bottlenecks" => state.filters.show_only_bottlenecks = is_truthy(&value),
                "ai" => state.filters.show_only_ai = is_truthy(&value),
                "errors" => state.filters.show_only_errors = is_truthy(&value),
                "from" => from = parse_instant(&value),
                "to" => to = parse_instant(&value),
                "find" => state.search_query = value,
                "match" => state.search_index = value.parse().unwrap_or(0),
                "sel" if !value.is_empty() => state.selected = Some(value),
                _ => {}
            }
        }

        if let (Some(start), Some(end)) = (start, end) {
            state.viewport = Some(Viewport { start, end });
        }
        if let (Some(start), Some(end)) = (from, to) {
            state.filters.time_range = Some(TimeRange { start, end });
        }
        state
    }
}

fn parse_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key, value))
        })
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
