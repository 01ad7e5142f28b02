//! Timeline viewport engine.
//!
//! A pure state machine: the rendering layer feeds [`EngineEvent`]s in and
//! redraws from the returned [`EngineOutput`]s or a fresh
//! [`EngineSnapshot`]. Nothing here blocks, spawns, or performs I/O.

use crate::error::{ConfigurationError, EngineError, Result};
use crate::filter::{Filters, apply_filters};
use crate::highlight::{DEFAULT_ADJACENCY_TOLERANCE_MS, Focus, related_to_with_tolerance};
use crate::item::TimelineItem;
use crate::lanes::pack_lanes;
use crate::markers::{DEFAULT_DENSITY_CAP, Markers, TimeMarker, TimeScale, generate_markers_capped};
use crate::search::SearchState;
use crate::timeline::Timeline;
use crate::validate::validate_items;
use crate::view_state::ViewState;
use crate::viewport::{
    DEFAULT_MIN_WINDOW_MS, DEFAULT_PAN_STEP, DEFAULT_ZOOM_STEP, Viewport, ViewportController,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tunables fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub min_window_ms: f64,
    pub zoom_step: f64,
    /// Fraction of the window moved by one pan step.
    pub pan_step: f64,
    pub density_cap: usize,
    pub default_scale: TimeScale,
    pub adjacency_tolerance_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_window_ms: DEFAULT_MIN_WINDOW_MS,
            zoom_step: DEFAULT_ZOOM_STEP,
            pan_step: DEFAULT_PAN_STEP,
            density_cap: DEFAULT_DENSITY_CAP,
            default_scale: TimeScale::default(),
            adjacency_tolerance_ms: DEFAULT_ADJACENCY_TOLERANCE_MS,
        }
    }
}

/// Input events, one per user gesture or data refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    ReplaceItems { items: Vec<TimelineItem> },
    SetFilters { filters: Filters },
    Zoom { anchor: f64, factor: f64 },
    ZoomIn { anchor: f64 },
    ZoomOut { anchor: f64 },
    Pan { delta: f64 },
    PanBackward,
    PanForward,
    SetScale { scale: TimeScale },
    ResetViewport,
    Search { query: String },
    SearchNext,
    SearchPrevious,
    Select { id: String },
    ClearSelection,
    Hover { id: String },
    ClearHover,
}

impl EngineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReplaceItems { .. } => "replace_items",
            Self::SetFilters { .. } => "set_filters",
            Self::Zoom { .. } => "zoom",
            Self::ZoomIn { .. } => "zoom_in",
            Self::ZoomOut { .. } => "zoom_out",
            Self::Pan { .. } => "pan",
            Self::PanBackward => "pan_backward",
            Self::PanForward => "pan_forward",
            Self::SetScale { .. } => "set_scale",
            Self::ResetViewport => "reset_viewport",
            Self::Search { .. } => "search",
            Self::SearchNext => "search_next",
            Self::SearchPrevious => "search_previous",
            Self::Select { .. } => "select",
            Self::ClearSelection => "clear_selection",
            Self::Hover { .. } => "hover",
            Self::ClearHover => "clear_hover",
        }
    }
}

/// Changes the caller should react to. Only emitted for real changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineOutput {
    ViewportChanged {
        viewport: Viewport,
        scale: TimeScale,
    },
    LanesChanged {
        lane_count: usize,
        item_count: usize,
    },
    SearchChanged {
        match_count: usize,
        current_index: usize,
        current_id: Option<String>,
    },
    ItemSelected {
        id: Option<String>,
    },
    HighlightChanged {
        focus_id: Option<String>,
        related: BTreeSet<String>,
    },
}

/// Plain, serializable view of everything the renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub timeline: Timeline,
    pub viewport: Viewport,
    pub scale: TimeScale,
    pub items: Vec<TimelineItem>,
    pub lane_count: usize,
    pub search: SearchState,
    pub selected: Option<String>,
    pub hovered: Option<String>,
    pub related: BTreeSet<String>,
    pub markers: Vec<TimeMarker>,
}

#[derive(Debug, Clone)]
pub struct TimelineEngine {
    config: EngineConfig,
    timeline: Timeline,
    items: Vec<TimelineItem>,
    visible: Vec<TimelineItem>,
    lane_count: usize,
    filters: Filters,
    viewport: ViewportController,
    search: SearchState,
    focus: Focus,
    /// Focus and related set as last reported to the caller.
    highlight_focus: Option<String>,
    related: BTreeSet<String>,
}

impl TimelineEngine {
    /// Empty engine over a fixed timeline.
    pub fn new(timeline: Timeline, config: EngineConfig) -> Result<Self> {
        if config.density_cap == 0 {
            return Err(ConfigurationError::ZeroDensityCap.into());
        }
        if !config.pan_step.is_finite() || config.pan_step <= 0.0 {
            return Err(ConfigurationError::NonFinite {
                name: "pan step",
                value: config.pan_step,
            }
            .into());
        }
        let mut viewport = ViewportController::new(timeline.total_duration_ms, config.min_window_ms)?
            .with_zoom_step(config.zoom_step)?;
        viewport.set_scale(config.default_scale);

        Ok(Self {
            config,
            timeline,
            items: Vec::new(),
            visible: Vec::new(),
            lane_count: 0,
            filters: Filters::default(),
            viewport,
            search: SearchState::default(),
            focus: Focus::default(),
            highlight_focus: None,
            related: BTreeSet::new(),
        })
    }

    /// Engine whose timeline spans the given snapshot.
    pub fn from_items(items: Vec<TimelineItem>, config: EngineConfig) -> Result<Self> {
        validate_items(&items).map_err(EngineError::InvalidItems)?;
        let timeline = Timeline::from_items(&items)?;
        let mut engine = Self::new(timeline, config)?;
        engine.apply(EngineEvent::ReplaceItems { items })?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Filtered items with lanes assigned, in snapshot order.
    pub fn items(&self) -> &[TimelineItem] {
        &self.visible
    }

    /// The unfiltered caller snapshot.
    pub fn all_items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn scale(&self) -> TimeScale {
        self.viewport.scale()
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    /// Ids emphasized around the active focus; everything else is faded.
    pub fn related(&self) -> &BTreeSet<String> {
        &self.related
    }

    pub fn markers(&self) -> Result<Markers> {
        let viewport = self.viewport();
        Ok(generate_markers_capped(
            self.timeline.total_duration_ms,
            self.scale(),
            viewport.start,
            viewport.end,
            self.config.density_cap,
        )?)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            timeline: self.timeline,
            viewport: self.viewport(),
            scale: self.scale(),
            items: self.visible.clone(),
            lane_count: self.lane_count,
            search: self.search.clone(),
            selected: self.focus.selected().map(str::to_string),
            hovered: self.focus.hovered().map(str::to_string),
            related: self.related.clone(),
            markers: self
                .markers()
                .map(|markers| markers.iter().collect())
                .unwrap_or_default(),
        }
    }

    pub fn apply(&mut self, event: EngineEvent) -> Result<Vec<EngineOutput>> {
        tracing::trace!(event = event.kind(), "applying engine event");
        let mut out = Vec::new();

        match event {
            EngineEvent::ReplaceItems { items } => self.replace_items(items, &mut out)?,
            EngineEvent::SetFilters { filters } => {
                if filters != self.filters {
                    self.filters = filters;
                    self.refilter(&mut out);
                }
            }
            EngineEvent::Zoom { anchor, factor } => {
                let changed = self.viewport.zoom(anchor, factor)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::ZoomIn { anchor } => {
                let changed = self.viewport.zoom_in(anchor)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::ZoomOut { anchor } => {
                let changed = self.viewport.zoom_out(anchor)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::Pan { delta } => {
                let changed = self.viewport.pan(delta)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::PanBackward => {
                let changed = self.viewport.pan(-self.config.pan_step)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::PanForward => {
                let changed = self.viewport.pan(self.config.pan_step)?;
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::SetScale { scale } => {
                let changed = self.viewport.set_scale(scale);
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::ResetViewport => {
                let changed = self.viewport.reset();
                self.push_viewport_if(changed, &mut out);
            }
            EngineEvent::Search { query } => {
                if self.search.set_query(&self.visible, &query) {
                    out.push(self.search_output());
                    self.recenter_on_current_match(&mut out);
                }
            }
            EngineEvent::SearchNext => {
                if self.search.next().is_some() {
                    out.push(self.search_output());
                    self.recenter_on_current_match(&mut out);
                }
            }
            EngineEvent::SearchPrevious => {
                if self.search.previous().is_some() {
                    out.push(self.search_output());
                    self.recenter_on_current_match(&mut out);
                }
            }
            EngineEvent::Select { id } => {
                if self.items.iter().any(|item| item.id == id) && self.focus.select(id) {
                    out.push(self.selection_output());
                    self.refresh_highlight(&mut out);
                }
            }
            EngineEvent::ClearSelection => {
                if self.focus.clear_selection() {
                    out.push(self.selection_output());
                    self.refresh_highlight(&mut out);
                }
            }
            EngineEvent::Hover { id } => {
                if self.items.iter().any(|item| item.id == id) && self.focus.hover(id) {
                    self.refresh_highlight(&mut out);
                }
            }
            EngineEvent::ClearHover => {
                if self.focus.clear_hover() {
                    self.refresh_highlight(&mut out);
                }
            }
        }

        Ok(out)
    }

    /// Current view state, for the caller to persist however it likes.
    pub fn view_state(&self) -> ViewState {
        ViewState {
            viewport: Some(self.viewport()),
            scale: self.scale(),
            filters: self.filters.clone(),
            search_query: self.search.query().to_string(),
            search_index: self.search.current_index(),
            selected: self.focus.selected().map(str::to_string),
        }
    }

    /// Re-apply persisted view state. The viewport is clamped to this
    /// timeline and stale selections are dropped.
    pub fn restore_view_state(&mut self, state: &ViewState) -> Result<Vec<EngineOutput>> {
        let mut out = Vec::new();

        if state.filters != self.filters {
            self.filters = state.filters.clone();
            self.refilter(&mut out);
        }

        let mut viewport_changed = self.viewport.set_scale(state.scale);
        viewport_changed |= match state.viewport {
            Some(viewport) => self.viewport.set_window(viewport.start, viewport.end)?,
            None => self.viewport.reset(),
        };
        self.push_viewport_if(viewport_changed, &mut out);

        let mut search_changed = self.search.set_query(&self.visible, &state.search_query);
        search_changed |= self.search.select_index(state.search_index);
        if search_changed {
            out.push(self.search_output());
        }

        let selection_changed = match &state.selected {
            Some(id) if self.items.iter().any(|item| item.id == *id) => self.focus.select(id.clone()),
            _ => self.focus.clear_selection(),
        };
        if selection_changed {
            out.push(self.selection_output());
        }
        self.refresh_highlight(&mut out);

        Ok(out)
    }

    fn replace_items(&mut self, mut items: Vec<TimelineItem>, out: &mut Vec<EngineOutput>) -> Result<()> {
        if let Err(errors) = validate_items(&items) {
            tracing::warn!(errors = errors.len(), "rejected item snapshot");
            return Err(EngineError::InvalidItems(errors));
        }
        for item in &mut items {
            item.duration_ms = Some(item.span_ms());
            item.lane = None;
        }
        self.items = items;

        let selected_before = self.focus.selected().map(str::to_string);
        self.focus.retain_known(&self.items);
        if self.focus.selected() != selected_before.as_deref() {
            out.push(self.selection_output());
        }

        self.refilter(out);
        Ok(())
    }

    /// Re-run filters, re-pack lanes, and refresh everything derived from
    /// the visible set. Viewport gestures never come through here.
    fn refilter(&mut self, out: &mut Vec<EngineOutput>) {
        let mut visible = apply_filters(&self.items, &self.filters);
        let lane_count = pack_lanes(&mut visible);

        if visible != self.visible || lane_count != self.lane_count {
            tracing::debug!(items = visible.len(), lanes = lane_count, "lanes re-packed");
            self.visible = visible;
            self.lane_count = lane_count;
            out.push(EngineOutput::LanesChanged {
                lane_count,
                item_count: self.visible.len(),
            });
        }

        if self.search.refresh(&self.visible) {
            out.push(self.search_output());
        }
        self.refresh_highlight(out);
    }

    fn refresh_highlight(&mut self, out: &mut Vec<EngineOutput>) {
        let focus_id = self.focus.active().map(str::to_string);
        let related = focus_id
            .as_deref()
            .map(|id| related_to_with_tolerance(id, &self.visible, self.config.adjacency_tolerance_ms))
            .unwrap_or_default();

        if focus_id != self.highlight_focus || related != self.related {
            self.highlight_focus = focus_id;
            self.related = related;
            out.push(EngineOutput::HighlightChanged {
                focus_id: self.highlight_focus.clone(),
                related: self.related.clone(),
            });
        }
    }

    fn recenter_on_current_match(&mut self, out: &mut Vec<EngineOutput>) {
        let Some(id) = self.search.current() else {
            return;
        };
        let Some(item) = self.visible.iter().find(|item| item.id == id) else {
            return;
        };
        let (start, end) = self.timeline.interval_of(item);
        let changed = self.viewport.center_on(start, end);
        self.push_viewport_if(changed, out);
    }

    fn push_viewport_if(&self, changed: bool, out: &mut Vec<EngineOutput>) {
        if changed {
            out.push(EngineOutput::ViewportChanged {
                viewport: self.viewport(),
                scale: self.scale(),
            });
        }
    }

    fn search_output(&self) -> EngineOutput {
        EngineOutput::SearchChanged {
            match_count: self.search.matches().len(),
            current_index: self.search.current_index(),
            current_id: self.search.current().map(str::to_string),
        }
    }

    fn selection_output(&self) -> EngineOutput {
        EngineOutput::ItemSelected {
            id: self.focus.selected().map(str::to_string),
        }
    }
}
