use crate::error::ConfigurationError;
use crate::item::TimelineItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed time frame of a session: the origin instant and the total
/// duration every viewport is a window into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub origin: DateTime<Utc>,
    pub total_duration_ms: f64,
}

impl Timeline {
    pub fn new(origin: DateTime<Utc>, total_duration_ms: f64) -> Result<Self, ConfigurationError> {
        if !total_duration_ms.is_finite() || total_duration_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveTotalDuration(
                total_duration_ms,
            ));
        }
        Ok(Self {
            origin,
            total_duration_ms,
        })
    }

    /// Span from the earliest start to the latest end of the snapshot.
    pub fn from_items(items: &[TimelineItem]) -> Result<Self, ConfigurationError> {
        let origin = items
            .iter()
            .map(|item| item.start_time)
            .min()
            .ok_or(ConfigurationError::EmptySnapshot)?;
        let end = items
            .iter()
            .map(|item| item.end_time)
            .max()
            .unwrap_or(origin);
        Self::new(origin, (end - origin).num_milliseconds() as f64)
    }

    pub fn offset_ms(&self, instant: DateTime<Utc>) -> f64 {
        (instant - self.origin).num_milliseconds() as f64
    }

    /// Item interval as `(start, end)` offsets in milliseconds.
    pub fn interval_of(&self, item: &TimelineItem) -> (f64, f64) {
        (self.offset_ms(item.start_time), self.offset_ms(item.end_time))
    }
}
