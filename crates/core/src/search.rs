use crate::item::TimelineItem;
use serde::{Deserialize, Serialize};

/// Case-insensitive match on `step_name` or `step_type`.
///
/// `lowered_query` must already be lowercase and non-empty.
pub fn matches_query(item: &TimelineItem, lowered_query: &str) -> bool {
    item.step_name.to_lowercase().contains(lowered_query)
        || item.step_type.as_str().to_lowercase().contains(lowered_query)
}

/// Ids of matching items, in the order they appear in `filtered`.
///
/// An empty (or whitespace-only) query means search is inactive and
/// matches nothing.
pub fn search(filtered: &[TimelineItem], query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    filtered
        .iter()
        .filter(|item| matches_query(item, &query))
        .map(|item| item.id.clone())
        .collect()
}

/// Ordered match list with a cyclic cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    query: String,
    matches: Vec<String>,
    current_index: usize,
}

impl SearchState {
    pub fn new(filtered: &[TimelineItem], query: &str) -> Self {
        Self {
            query: query.to_string(),
            matches: search(filtered, query),
            current_index: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_active(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Id of the match under the cursor.
    pub fn current(&self) -> Option<&str> {
        self.matches.get(self.current_index).map(String::as_str)
    }

    /// Advance to the next match, wrapping to the first.
    /// No-op (returns `None`) when there are no matches.
    pub fn next(&mut self) -> Option<&str> {
        if self.matches.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.matches.len();
        self.current()
    }

    /// Step back to the previous match, wrapping to the last.
    pub fn previous(&mut self) -> Option<&str> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.current()
    }

    /// Move the cursor to `index` if it is in range.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.matches.len() && index != self.current_index {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    /// Replace the query and restart at the first match.
    /// Returns whether the query or the match list changed.
    pub fn set_query(&mut self, filtered: &[TimelineItem], query: &str) -> bool {
        let next = Self::new(filtered, query);
        let changed = next != *self;
        *self = next;
        changed
    }

    /// Recompute matches for a new filtered set, keeping the cursor on the
    /// same item when it still matches.
    pub fn refresh(&mut self, filtered: &[TimelineItem]) -> bool {
        let current = self.current().map(str::to_string);
        let matches = search(filtered, &self.query);
        let current_index = current
            .and_then(|id| matches.iter().position(|m| *m == id))
            .unwrap_or(0);

        let changed = matches != self.matches || current_index != self.current_index;
        self.matches = matches;
        self.current_index = current_index;
        if changed {
            tracing::debug!(
                query = %self.query,
                matches = self.matches.len(),
                current_index,
                "search refreshed"
            );
        }
        changed
    }
}
