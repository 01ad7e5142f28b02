use crate::validate::ValidationError;

/// Malformed static input. Fatal, reported immediately.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("total duration must be positive, got {0} ms")]
    NonPositiveTotalDuration(f64),

    #[error("minimum window must be positive, got {0} ms")]
    NonPositiveMinWindow(f64),

    #[error("minimum window {min_window_ms} ms exceeds total duration {total_duration_ms} ms")]
    MinWindowExceedsTotal {
        min_window_ms: f64,
        total_duration_ms: f64,
    },

    #[error("zoom factor must be positive and finite, got {0}")]
    InvalidZoomFactor(f64),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("marker density cap must be at least 1")]
    ZeroDensityCap,

    #[error("viewport end {end} must be greater than start {start}")]
    EmptyViewport { start: f64, end: f64 },

    #[error("cannot derive a timeline from an empty item snapshot")]
    EmptySnapshot,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("invalid item snapshot: {}", summarize(.0))]
    InvalidItems(Vec<ValidationError>),
}

pub type Result<T> = std::result::Result<T, EngineError>;

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Reject NaN and infinities before they reach viewport math.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> std::result::Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NonFinite { name, value })
    }
}
