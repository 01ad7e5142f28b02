use crate::{StepType, TimelineItem};
use chrono::{DateTime, TimeZone, Utc};

/// Fixed origin used by fixtures (2026-01-01T00:00:00Z).
pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Instant `ms` milliseconds after [`origin`].
pub fn at(ms: i64) -> DateTime<Utc> {
    origin() + chrono::Duration::milliseconds(ms)
}

/// Action item spanning `[start_ms, end_ms)` relative to [`origin`].
pub fn item(id: &str, start_ms: i64, end_ms: i64) -> TimelineItem {
    typed_item(id, &format!("step {id}"), StepType::Action, start_ms, end_ms)
}

/// Item with an explicit name and category.
pub fn typed_item(
    id: &str,
    name: &str,
    step_type: StepType,
    start_ms: i64,
    end_ms: i64,
) -> TimelineItem {
    TimelineItem::new(
        id,
        format!("step-{id}"),
        name,
        step_type,
        at(start_ms),
        at(end_ms),
    )
}

/// Deterministic pseudo-random intervals for property checks.
///
/// Uses a fixed-seed xorshift so every run sees the same item sets.
pub fn random_items(seed: u64, count: usize, horizon_ms: i64) -> Vec<TimelineItem> {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    (0..count)
        .map(|i| {
            let start = (next() % horizon_ms.max(1) as u64) as i64;
            let len = (next() % (horizon_ms / 4).max(1) as u64) as i64;
            item(&format!("r{i}"), start, start + len)
        })
        .collect()
}
