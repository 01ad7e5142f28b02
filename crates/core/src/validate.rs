use crate::item::TimelineItem;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("item at index {index} has an empty id")]
    MissingId { index: usize },
    #[error("duplicate item id: {id}")]
    DuplicateId { id: String },
    #[error("item {id} ends before it starts")]
    EndBeforeStart { id: String },
    #[error("item {id} declares duration {declared} ms but spans {actual} ms")]
    DurationMismatch {
        id: String,
        declared: i64,
        actual: i64,
    },
}

/// Validate an item snapshot by composing independent validators.
pub fn validate_items(items: &[TimelineItem]) -> Result<(), Vec<ValidationError>> {
    let validators: &[fn(&[TimelineItem]) -> Vec<ValidationError>] = &[
        validate_ids,
        validate_unique_ids,
        validate_intervals,
    ];

    let errors: Vec<ValidationError> = validators.iter().flat_map(|v| v(items)).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_ids(items: &[TimelineItem]) -> Vec<ValidationError> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.id.is_empty())
        .map(|(index, _)| ValidationError::MissingId { index })
        .collect()
}

fn validate_unique_ids(items: &[TimelineItem]) -> Vec<ValidationError> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .filter(|item| !item.id.is_empty())
        .filter_map(|item| {
            if seen.insert(item.id.as_str()) {
                None
            } else {
                Some(ValidationError::DuplicateId {
                    id: item.id.clone(),
                })
            }
        })
        .collect()
}

fn validate_intervals(items: &[TimelineItem]) -> Vec<ValidationError> {
    items.iter().filter_map(|item| validate_item(item).err()).collect()
}

/// Validate a single item's interval and declared duration.
pub fn validate_item(item: &TimelineItem) -> Result<(), ValidationError> {
    let actual = item.span_ms();
    if actual < 0 {
        return Err(ValidationError::EndBeforeStart {
            id: item.id.clone(),
        });
    }

    match item.duration_ms {
        Some(declared) if declared != actual => Err(ValidationError::DurationMismatch {
            id: item.id.clone(),
            declared,
            actual,
        }),
        _ => Ok(()),
    }
}
