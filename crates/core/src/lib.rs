//! Timeline viewport engine for execution traces.
//!
//! Turns a snapshot of timestamped steps into something a renderer can draw:
//! non-overlapping lanes, a zoomable and pannable window, time markers,
//! filters, search navigation and related-item highlighting.

pub mod engine;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod item;
pub mod lanes;
pub mod markers;
pub mod search;
pub mod timeline;
pub mod validate;
pub mod view_state;
pub mod viewport;

pub use engine::{EngineConfig, EngineEvent, EngineOutput, EngineSnapshot, TimelineEngine};
pub use error::{ConfigurationError, EngineError, Result};
pub use filter::{Filters, TimeRange, apply_filters};
pub use highlight::{Focus, related_to, related_to_with_tolerance};
pub use item::{ItemFlags, StepStatus, StepType, TimelineItem};
pub use lanes::{assign_lanes, lane_count, max_concurrency, pack_lanes};
pub use markers::{Markers, TimeMarker, TimeScale, generate_markers, generate_markers_capped};
pub use search::{SearchState, search};
pub use timeline::Timeline;
pub use validate::ValidationError;
pub use view_state::ViewState;
pub use viewport::{Viewport, ViewportController};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
