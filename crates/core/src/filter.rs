use crate::item::{StepStatus, StepType, TimelineItem};
use crate::search::matches_query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Independent predicates, composed with logical AND.
///
/// `None`, `false`, an empty query, or `"all"` on the wire mean
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    #[serde(with = "all_or")]
    pub step_type: Option<StepType>,
    #[serde(with = "all_or")]
    pub step_status: Option<StepStatus>,
    pub search_query: String,
    pub show_only_bottlenecks: bool,
    #[serde(rename = "showOnlyAI")]
    pub show_only_ai: bool,
    pub show_only_errors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

/// Closed range of absolute instants. Items keep their half-open
/// `[start, end)` reading when tested against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Whether `[start_time, end_time)` shares an instant with the range.
    /// A zero-length item counts when its instant lies in the range.
    pub fn intersects(&self, item: &TimelineItem) -> bool {
        if item.start_time == item.end_time {
            return self.start <= item.start_time && item.start_time <= self.end;
        }
        item.start_time <= self.end && item.end_time > self.start
    }
}

impl Filters {
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    pub fn matches(&self, item: &TimelineItem) -> bool {
        let predicates: &[fn(&Self, &TimelineItem) -> bool] = &[
            Self::matches_step_type,
            Self::matches_status,
            Self::matches_search,
            Self::matches_bottleneck,
            Self::matches_ai,
            Self::matches_error,
            Self::matches_time_range,
        ];
        predicates.iter().all(|predicate| predicate(self, item))
    }

    fn matches_step_type(&self, item: &TimelineItem) -> bool {
        self.step_type
            .as_ref()
            .is_none_or(|wanted| *wanted == item.step_type)
    }

    fn matches_status(&self, item: &TimelineItem) -> bool {
        self.step_status
            .as_ref()
            .is_none_or(|wanted| *wanted == item.status)
    }

    fn matches_search(&self, item: &TimelineItem) -> bool {
        let query = self.search_query.trim();
        query.is_empty() || matches_query(item, &query.to_lowercase())
    }

    fn matches_bottleneck(&self, item: &TimelineItem) -> bool {
        !self.show_only_bottlenecks || item.is_bottleneck
    }

    fn matches_ai(&self, item: &TimelineItem) -> bool {
        !self.show_only_ai || item.is_ai || item.step_type == StepType::Ai
    }

    fn matches_error(&self, item: &TimelineItem) -> bool {
        !self.show_only_errors || item.has_error || item.status == StepStatus::Error
    }

    fn matches_time_range(&self, item: &TimelineItem) -> bool {
        self.time_range
            .as_ref()
            .is_none_or(|range| range.intersects(item))
    }
}

/// Items passing every active filter, in their original order.
pub fn apply_filters(items: &[TimelineItem], filters: &Filters) -> Vec<TimelineItem> {
    items
        .iter()
        .filter(|item| filters.matches(item))
        .cloned()
        .collect()
}

/// `"all"` (or an empty string) on the wire is `None` in memory.
mod all_or {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Clone + Into<String>,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.clone().into()),
            None => serializer.serialize_str("all"),
        }
    }

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<String>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .filter(|raw| !raw.trim().is_empty() && !raw.trim().eq_ignore_ascii_case("all"))
            .map(T::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemFlags;
    use crate::testing::{at, item, random_items, typed_item};

    fn ids(items: &[TimelineItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    fn fixture() -> Vec<TimelineItem> {
        let ai = typed_item("ai", "Score lead", StepType::Action, 0, 4_000).with_flags(ItemFlags {
            ai: true,
            ..ItemFlags::default()
        });
        let slow = typed_item("slow", "Enrich company", StepType::Enrichment, 2_000, 30_000)
            .with_flags(ItemFlags {
                bottleneck: true,
                fallback: true,
                ..ItemFlags::default()
            });
        let failed = typed_item("failed", "Send email", StepType::Action, 31_000, 32_000)
            .with_status(StepStatus::Error);
        let gate = typed_item("gate", "Approve", StepType::Decision, 40_000, 41_000)
            .with_status(StepStatus::Skipped);
        vec![ai, slow, failed, gate]
    }

    #[test]
    fn default_filters_keep_everything() {
        let items = fixture();
        assert!(!Filters::default().is_active());
        assert_eq!(apply_filters(&items, &Filters::default()), items);
    }

    #[test]
    fn each_predicate_narrows_independently() {
        let items = fixture();
        let cases = [
            (
                Filters {
                    step_type: Some(StepType::Decision),
                    ..Filters::default()
                },
                vec!["gate"],
            ),
            (
                Filters {
                    step_status: Some(StepStatus::Error),
                    ..Filters::default()
                },
                vec!["failed"],
            ),
            (
                Filters {
                    search_query: "  ENRICH ".to_string(),
                    ..Filters::default()
                },
                vec!["slow"],
            ),
            (
                Filters {
                    show_only_bottlenecks: true,
                    ..Filters::default()
                },
                vec!["slow"],
            ),
            (
                Filters {
                    show_only_ai: true,
                    ..Filters::default()
                },
                vec!["ai"],
            ),
            (
                Filters {
                    show_only_errors: true,
                    ..Filters::default()
                },
                vec!["failed"],
            ),
        ];

        for (filters, expected) in cases {
            assert!(filters.is_active());
            assert_eq!(ids(&apply_filters(&items, &filters)), expected, "{filters:?}");
        }
    }

    #[test]
    fn predicates_compose_with_and() {
        let items = fixture();
        let filters = Filters {
            show_only_ai: true,
            show_only_bottlenecks: true,
            ..Filters::default()
        };
        assert!(apply_filters(&items, &filters).is_empty());
    }

    #[test]
    fn time_range_matches_intersection_not_containment() {
        let items = fixture();
        let filters = Filters {
            time_range: Some(TimeRange {
                start: at(3_000),
                end: at(31_000),
            }),
            ..Filters::default()
        };
        // ai overlaps the start, slow straddles, failed starts on the end
        assert_eq!(ids(&apply_filters(&items, &filters)), vec!["ai", "slow", "failed"]);
    }

    #[test]
    fn time_range_treats_item_ends_as_exclusive() {
        let items = vec![
            item("ends_on_start", 0, 3_000),
            item("instant_on_start", 3_000, 3_000),
            item("instant_on_end", 5_000, 5_000),
            item("starts_on_end", 5_000, 6_000),
            item("instant_after", 5_001, 5_001),
        ];
        let filters = Filters {
            time_range: Some(TimeRange {
                start: at(3_000),
                end: at(5_000),
            }),
            ..Filters::default()
        };
        assert_eq!(
            ids(&apply_filters(&items, &filters)),
            vec!["instant_on_start", "instant_on_end", "starts_on_end"]
        );
    }

    #[test]
    fn filtering_is_idempotent() {
        let filters = Filters {
            time_range: Some(TimeRange {
                start: at(10_000),
                end: at(50_000),
            }),
            search_query: "1".to_string(),
            ..Filters::default()
        };
        for seed in 1..=10 {
            let items = random_items(seed, 50, 100_000);
            let once = apply_filters(&items, &filters);
            let twice = apply_filters(&once, &filters);
            assert_eq!(once, twice, "seed {seed}");
        }
    }

    #[test]
    fn all_on_the_wire_means_no_constraint() {
        let filters: Filters = serde_json::from_str(
            r#"{"stepType":"all","stepStatus":"error","showOnlyAI":true}"#,
        )
        .expect("parse filters");
        assert_eq!(filters.step_type, None);
        assert_eq!(filters.step_status, Some(StepStatus::Error));
        assert!(filters.show_only_ai);
        assert!(filters.search_query.is_empty());

        let encoded = serde_json::to_value(&filters).expect("encode");
        assert_eq!(encoded["stepType"], "all");
        assert_eq!(encoded["stepStatus"], "error");
    }

    #[test]
    fn order_is_preserved() {
        let items = vec![item("c", 5, 6), item("a", 0, 1), item("b", 2, 3)];
        assert_eq!(ids(&apply_filters(&items, &Filters::default())), vec!["c", "a", "b"]);
    }
}
