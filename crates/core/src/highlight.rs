use crate::item::TimelineItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Items within this gap on the same lane count as related.
/// Zero means touching or overlapping.
pub const DEFAULT_ADJACENCY_TOLERANCE_MS: i64 = 0;

/// Ids related to `focus_id`, including the focus itself.
///
/// Unknown ids yield an empty set.
pub fn related_to(focus_id: &str, items: &[TimelineItem]) -> BTreeSet<String> {
    related_to_with_tolerance(focus_id, items, DEFAULT_ADJACENCY_TOLERANCE_MS)
}

/// Explicit parent/child links win; without any, lane neighbours whose
/// intervals are within `tolerance_ms` of the focus are related.
pub fn related_to_with_tolerance(
    focus_id: &str,
    items: &[TimelineItem],
    tolerance_ms: i64,
) -> BTreeSet<String> {
    let Some(focus) = items.iter().find(|item| item.id == focus_id) else {
        return BTreeSet::new();
    };

    let mut related: BTreeSet<String> = items
        .iter()
        .filter(|item| item.id != focus.id && is_linked(focus, item))
        .map(|item| item.id.clone())
        .collect();

    if related.is_empty() {
        if let Some(lane) = focus.lane {
            related.extend(
                items
                    .iter()
                    .filter(|item| item.id != focus.id && item.lane == Some(lane))
                    .filter(|item| gap_ms(focus, item) <= tolerance_ms)
                    .map(|item| item.id.clone()),
            );
        }
    }

    related.insert(focus.id.clone());
    related
}

fn is_linked(a: &TimelineItem, b: &TimelineItem) -> bool {
    a.parent_id.as_deref() == Some(b.id.as_str()) || b.parent_id.as_deref() == Some(a.id.as_str())
}

/// Distance between two intervals; negative when they overlap.
fn gap_ms(a: &TimelineItem, b: &TimelineItem) -> i64 {
    let later_start = a.start_time.max(b.start_time);
    let earlier_end = a.end_time.min(b.end_time);
    (later_start - earlier_end).num_milliseconds()
}

/// Independent hover and selection foci.
///
/// Selection persists until cleared; hover is transient and, while set,
/// overrides the selection as the visual focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    selected: Option<String>,
    hovered: Option<String>,
}

impl Focus {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// The focus that drives emphasis right now.
    pub fn active(&self) -> Option<&str> {
        self.hovered().or_else(|| self.selected())
    }

    pub fn select(&mut self, id: impl Into<String>) -> bool {
        replace(&mut self.selected, Some(id.into()))
    }

    pub fn clear_selection(&mut self) -> bool {
        replace(&mut self.selected, None)
    }

    pub fn hover(&mut self, id: impl Into<String>) -> bool {
        replace(&mut self.hovered, Some(id.into()))
    }

    pub fn clear_hover(&mut self) -> bool {
        replace(&mut self.hovered, None)
    }

    /// Drop foci that point at items no longer present.
    pub fn retain_known(&mut self, items: &[TimelineItem]) -> bool {
        let known = |id: &Option<String>| {
            id.as_deref()
                .is_none_or(|id| items.iter().any(|item| item.id == id))
        };
        let mut changed = false;
        if !known(&self.selected) {
            changed |= self.clear_selection();
        }
        if !known(&self.hovered) {
            changed |= self.clear_hover();
        }
        changed
    }
}

fn replace(slot: &mut Option<String>, next: Option<String>) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::assign_lanes;
    use crate::testing::item;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn lane_neighbours_that_touch_are_related() {
        let items = assign_lanes(vec![
            item("a", 0, 10_000),
            item("b", 10_000, 20_000),
            item("c", 25_000, 30_000),
            item("d", 5_000, 15_000),
        ]);
        assert_eq!(items[1].lane, items[0].lane);
        assert_eq!(related_to("b", &items), set(&["a", "b"]));
        assert_eq!(related_to("c", &items), set(&["c"]));
    }

    #[test]
    fn tolerance_widens_adjacency() {
        let items = assign_lanes(vec![
            item("a", 0, 10_000),
            item("b", 10_000, 20_000),
            item("c", 25_000, 30_000),
        ]);
        assert_eq!(
            related_to_with_tolerance("c", &items, 5_000),
            set(&["b", "c"])
        );
    }

    #[test]
    fn explicit_links_take_precedence_over_lanes() {
        let items = assign_lanes(vec![
            item("parent", 0, 10_000),
            item("child", 20_000, 30_000).with_parent("parent"),
            item("neighbour", 10_000, 20_000),
        ]);
        assert_eq!(related_to("parent", &items), set(&["child", "parent"]));
        assert_eq!(related_to("child", &items), set(&["child", "parent"]));
        // no links: falls back to lane adjacency
        assert_eq!(
            related_to("neighbour", &items),
            set(&["child", "neighbour", "parent"])
        );
    }

    #[test]
    fn unknown_focus_is_empty() {
        let items = assign_lanes(vec![item("a", 0, 1_000)]);
        assert!(related_to("missing", &items).is_empty());
    }

    #[test]
    fn hover_overrides_selection_while_active() {
        let mut focus = Focus::default();
        assert_eq!(focus.active(), None);
        assert!(focus.select("a"));
        assert!(!focus.select("a"));
        assert!(focus.hover("b"));
        assert_eq!(focus.active(), Some("b"));
        assert!(focus.clear_hover());
        assert_eq!(focus.active(), Some("a"));
        assert!(focus.clear_selection());
        assert_eq!(focus.active(), None);
    }

    #[test]
    fn retain_known_drops_missing_foci() {
        let items = vec![item("a", 0, 1_000)];
        let mut focus = Focus::default();
        focus.select("a");
        focus.hover("gone");
        assert!(focus.retain_known(&items));
        assert_eq!(focus.selected(), Some("a"));
        assert_eq!(focus.hovered(), None);
        assert!(!focus.retain_known(&items));
    }
}
