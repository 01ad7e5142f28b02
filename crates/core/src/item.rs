use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One scheduled or executed unit of work on the timeline.
///
/// Items are owned by the caller and supplied wholesale on every refresh.
/// The engine only fills in derived fields (`duration_ms`, `lane`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    /// Unique identifier, stable across re-filtering
    pub id: String,
    pub step_id: String,
    pub step_name: String,
    pub step_type: StepType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time` in milliseconds. Derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, rename = "isAI")]
    pub is_ai: bool,
    #[serde(default)]
    pub is_decision: bool,
    #[serde(default)]
    pub is_checkpoint: bool,
    #[serde(default)]
    pub has_error: bool,
    #[serde(default)]
    pub has_fallback: bool,
    #[serde(default)]
    pub is_bottleneck: bool,
    /// Explicit link to the parent step's item id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Arbitrary caller metadata, carried through untouched
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
    /// Assigned by lane packing; never accepted from the caller.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub lane: Option<usize>,
}

impl TimelineItem {
    pub fn new(
        id: impl Into<String>,
        step_id: impl Into<String>,
        step_name: impl Into<String>,
        step_type: StepType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let mut item = Self {
            id: id.into(),
            step_id: step_id.into(),
            step_name: step_name.into(),
            step_type,
            start_time,
            end_time,
            duration_ms: None,
            status: StepStatus::default(),
            is_ai: false,
            is_decision: false,
            is_checkpoint: false,
            has_error: false,
            has_fallback: false,
            is_bottleneck: false,
            parent_id: None,
            attributes: HashMap::new(),
            lane: None,
        };
        item.duration_ms = Some(item.span_ms());
        item
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.is_ai = flags.ai;
        self.is_decision = flags.decision;
        self.is_checkpoint = flags.checkpoint;
        self.has_error = flags.error;
        self.has_fallback = flags.fallback;
        self.is_bottleneck = flags.bottleneck;
        self
    }

    /// Milliseconds between `start_time` and `end_time`.
    pub fn span_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// Whether `[start, end)` of both items overlap. Zero-length items
    /// overlap anything that strictly contains their instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Informational booleans, used only for coloring and filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    pub ai: bool,
    pub decision: bool,
    pub checkpoint: bool,
    pub error: bool,
    pub fallback: bool,
    pub bottleneck: bool,
}

/// Step category. Unknown categories round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Ai,
    Action,
    Decision,
    Enrichment,
    Checkpoint,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ai => "ai",
            Self::Action => "action",
            Self::Decision => "decision",
            Self::Enrichment => "enrichment",
            Self::Checkpoint => "checkpoint",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for StepType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "ai" => Self::Ai,
            "action" => Self::Action,
            "decision" => Self::Decision,
            "enrichment" => Self::Enrichment,
            "checkpoint" => Self::Checkpoint,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for StepType {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<StepType> for String {
    fn from(value: StepType) -> Self {
        match value {
            StepType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution status of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepStatus {
    Pending,
    Running,
    #[default]
    Completed,
    Skipped,
    Error,
    Other(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Error => "error",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for StepStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "skipped" => Self::Skipped,
            "error" | "failed" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for StepStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<StepStatus> for String {
    fn from(value: StepStatus) -> Self {
        match value {
            StepStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
