use crate::item::TimelineItem;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Assign every item to the lowest-numbered lane it fits in.
///
/// Items are visited by `start_time`, then `end_time`, then `id`. Each lane
/// remembers the end of its last item; an item joins the first lane whose
/// recorded end is `<= start_time` (half-open intervals, so back-to-back
/// items share a lane), otherwise it opens a new lane. This is greedy
/// interval-graph coloring and uses the minimum number of lanes.
///
/// The returned items keep the input order; only `lane` is written.
pub fn assign_lanes(mut items: Vec<TimelineItem>) -> Vec<TimelineItem> {
    pack_lanes(&mut items);
    items
}

/// In-place variant of [`assign_lanes`]. Returns the number of lanes used.
pub fn pack_lanes(items: &mut [TimelineItem]) -> usize {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| packing_order(&items[a], &items[b]));

    let mut lane_ends: Vec<DateTime<Utc>> = Vec::new();
    for index in order {
        let item = &mut items[index];
        let lane = match lane_ends.iter().position(|end| *end <= item.start_time) {
            Some(free) => free,
            None => {
                lane_ends.push(item.end_time);
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = item.end_time;
        item.lane = Some(lane);
    }

    tracing::trace!(items = items.len(), lanes = lane_ends.len(), "packed lanes");
    lane_ends.len()
}

fn packing_order(a: &TimelineItem, b: &TimelineItem) -> Ordering {
    a.start_time
        .cmp(&b.start_time)
        .then_with(|| a.end_time.cmp(&b.end_time))
        .then_with(|| a.id.cmp(&b.id))
}

/// Number of lanes occupied by packed items.
pub fn lane_count(items: &[TimelineItem]) -> usize {
    items
        .iter()
        .filter_map(|item| item.lane)
        .max()
        .map_or(0, |lane| lane + 1)
}

/// Largest number of items that must sit in distinct lanes at once.
///
/// For each item start `s`, counts the items whose `[start, end)` contains
/// `s`. A zero-length item still needs a lane of its own at its instant, so
/// it counts itself plus the items that were already running before `s`.
pub fn max_concurrency(items: &[TimelineItem]) -> usize {
    items
        .iter()
        .map(|probe| {
            let s = probe.start_time;
            if probe.end_time == s {
                1 + items
                    .iter()
                    .filter(|other| other.start_time < s && s < other.end_time)
                    .count()
            } else {
                items
                    .iter()
                    .filter(|other| other.start_time <= s && s < other.end_time)
                    .count()
            }
        })
        .max()
        .unwrap_or(0)
}
