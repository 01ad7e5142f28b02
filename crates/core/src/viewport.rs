use crate::error::{ConfigurationError, ensure_finite};
use crate::markers::TimeScale;
use serde::{Deserialize, Serialize};

/// Smallest window a viewport may zoom into, unless configured otherwise.
pub const DEFAULT_MIN_WINDOW_MS: f64 = 1_000.0;

/// Factor applied by one zoom-in step. Zooming out uses the reciprocal.
pub const DEFAULT_ZOOM_STEP: f64 = 0.8;

/// Fraction of the window moved by one pan step.
pub const DEFAULT_PAN_STEP: f64 = 0.1;

/// Visible `[start, end]` window, in milliseconds from the timeline origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub start: f64,
    pub end: f64,
}

impl Viewport {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Offset in milliseconds as a percentage of the viewport width.
    pub fn ms_to_percent(&self, ms: f64) -> f64 {
        (ms - self.start) / self.duration() * 100.0
    }

    pub fn percent_to_ms(&self, percent: f64) -> f64 {
        self.start + self.duration() * percent / 100.0
    }
}

/// Owns the visible window over a fixed total duration.
///
/// Every operation is a synchronous function of the current state and its
/// input. Requests that would leave `[0, total]` or shrink the window below
/// `min_window_ms` are clamped (zoom) or ignored (pan); only malformed input
/// is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    viewport: Viewport,
    total_duration_ms: f64,
    min_window_ms: f64,
    zoom_step: f64,
    scale: TimeScale,
}

impl ViewportController {
    /// Controller showing the whole timeline.
    pub fn new(total_duration_ms: f64, min_window_ms: f64) -> Result<Self, ConfigurationError> {
        if !total_duration_ms.is_finite() || total_duration_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveTotalDuration(
                total_duration_ms,
            ));
        }
        if !min_window_ms.is_finite() || min_window_ms <= 0.0 {
            return Err(ConfigurationError::NonPositiveMinWindow(min_window_ms));
        }
        if min_window_ms > total_duration_ms {
            return Err(ConfigurationError::MinWindowExceedsTotal {
                min_window_ms,
                total_duration_ms,
            });
        }

        Ok(Self {
            viewport: Viewport {
                start: 0.0,
                end: total_duration_ms,
            },
            total_duration_ms,
            min_window_ms,
            zoom_step: DEFAULT_ZOOM_STEP,
            scale: TimeScale::default(),
        })
    }

    pub fn with_zoom_step(mut self, zoom_step: f64) -> Result<Self, ConfigurationError> {
        if !zoom_step.is_finite() || zoom_step <= 0.0 {
            return Err(ConfigurationError::InvalidZoomFactor(zoom_step));
        }
        self.zoom_step = zoom_step;
        Ok(self)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    pub fn min_window_ms(&self) -> f64 {
        self.min_window_ms
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Scale the window by `factor` around the instant at `anchor_fraction`.
    ///
    /// The anchored instant keeps its relative position unless the new
    /// window would cross a timeline boundary, in which case the window is
    /// shifted back inside without changing its duration.
    /// Returns whether the viewport changed.
    pub fn zoom(&mut self, anchor_fraction: f64, factor: f64) -> Result<bool, ConfigurationError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigurationError::InvalidZoomFactor(factor));
        }
        let anchor = ensure_finite("anchor fraction", anchor_fraction)?.clamp(0.0, 1.0);

        let anchor_time = self.viewport.percent_to_ms(anchor * 100.0);
        let new_duration = self.clamp_duration(self.viewport.duration() * factor);
        let new_start = anchor_time - new_duration * anchor;

        Ok(self.place(new_start, new_duration))
    }

    pub fn zoom_in(&mut self, anchor_fraction: f64) -> Result<bool, ConfigurationError> {
        self.zoom(anchor_fraction, self.zoom_step)
    }

    pub fn zoom_out(&mut self, anchor_fraction: f64) -> Result<bool, ConfigurationError> {
        self.zoom(anchor_fraction, 1.0 / self.zoom_step)
    }

    /// Translate the window by `delta_fraction` of its duration.
    ///
    /// A pan that would move the window outside `[0, total]` is ignored.
    pub fn pan(&mut self, delta_fraction: f64) -> Result<bool, ConfigurationError> {
        let delta = ensure_finite("pan delta", delta_fraction)?;
        let shift = delta * self.viewport.duration();
        let start = self.viewport.start + shift;
        let end = self.viewport.end + shift;

        if start < 0.0 || end > self.total_duration_ms {
            tracing::debug!(start, end, "pan rejected: window would leave the timeline");
            return Ok(false);
        }
        Ok(self.set(Viewport { start, end }))
    }

    /// Changes only the caller-visible scale; the window is untouched.
    pub fn set_scale(&mut self, scale: TimeScale) -> bool {
        let changed = self.scale != scale;
        self.scale = scale;
        changed
    }

    /// Show the whole timeline.
    pub fn reset(&mut self) -> bool {
        self.set(Viewport {
            start: 0.0,
            end: self.total_duration_ms,
        })
    }

    /// Restore a window (e.g. from persisted view state), clamped like zoom.
    pub fn set_window(&mut self, start: f64, end: f64) -> Result<bool, ConfigurationError> {
        let start = ensure_finite("viewport start", start)?;
        let end = ensure_finite("viewport end", end)?;
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let duration = self.clamp_duration(end - start);
        Ok(self.place(start, duration))
    }

    /// Center the window on `[start_ms, end_ms]`.
    ///
    /// The current duration is kept unless the interval is longer than the
    /// window, in which case the window grows to fit it (up to the total).
    pub fn center_on(&mut self, start_ms: f64, end_ms: f64) -> bool {
        if !start_ms.is_finite() || !end_ms.is_finite() {
            return false;
        }
        let length = (end_ms - start_ms).abs();
        let mut duration = self.viewport.duration();
        if length > duration {
            duration = self.clamp_duration(length);
        }
        let center = (start_ms + end_ms) / 2.0;
        self.place(center - duration / 2.0, duration)
    }

    fn clamp_duration(&self, duration: f64) -> f64 {
        duration.clamp(self.min_window_ms, self.total_duration_ms)
    }

    /// Put a window of `duration` at `start`, shifting it inside the timeline.
    fn place(&mut self, start: f64, duration: f64) -> bool {
        let start = start.clamp(0.0, self.total_duration_ms - duration);
        let end = (start + duration).min(self.total_duration_ms);
        self.set(Viewport { start, end })
    }

    fn set(&mut self, next: Viewport) -> bool {
        if next == self.viewport {
            return false;
        }
        tracing::debug!(start = next.start, end = next.end, "viewport changed");
        self.viewport = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn controller() -> ViewportController {
        ViewportController::new(60_000.0, 1_000.0).expect("controller")
    }

    fn assert_contained(c: &ViewportController) {
        let v = c.viewport();
        assert!(v.start >= 0.0, "start {} < 0", v.start);
        assert!(v.start < v.end, "start {} >= end {}", v.start, v.end);
        assert!(v.end <= c.total_duration_ms() + EPS, "end {} past total", v.end);
        assert!(
            v.duration() >= c.min_window_ms() - EPS,
            "window {} below minimum",
            v.duration()
        );
    }

    #[test]
    fn zoom_in_around_center_halves_the_window() {
        let mut c = controller();
        assert!(c.zoom(0.5, 0.5).expect("zoom"));
        assert_eq!(
            c.viewport(),
            Viewport {
                start: 15_000.0,
                end: 45_000.0
            }
        );
    }

    #[test]
    fn zoom_keeps_anchor_instant_fixed() {
        let mut c = controller();
        c.set_window(20_000.0, 40_000.0).expect("window");
        for (anchor, factor) in [(0.25, 0.5), (0.9, 1.2), (0.1, 0.8), (0.5, 0.3)] {
            let before = c.viewport();
            let anchor_time = before.percent_to_ms(anchor * 100.0);
            c.zoom(anchor, factor).expect("zoom");
            let after = c.viewport();
            assert!(
                (after.percent_to_ms(anchor * 100.0) - anchor_time).abs() < EPS,
                "anchor {anchor} moved from {anchor_time}"
            );
        }
    }

    #[test]
    fn zoom_out_at_edge_shifts_instead_of_shrinking() {
        let mut c = controller();
        c.set_window(0.0, 10_000.0).expect("window");
        c.zoom(0.0, 0.5).expect("zoom in at left edge");
        assert_eq!(c.viewport().start, 0.0);
        assert_eq!(c.viewport().end, 5_000.0);

        c.set_window(50_000.0, 60_000.0).expect("window");
        c.zoom(0.2, 3.0).expect("zoom out near right edge");
        let v = c.viewport();
        assert!((v.duration() - 30_000.0).abs() < EPS);
        assert!((v.end - 60_000.0).abs() < EPS);
    }

    #[test]
    fn zoom_is_clamped_to_min_window_and_total() {
        let mut c = controller();
        c.zoom(0.5, 1e-6).expect("deep zoom");
        assert!((c.viewport().duration() - 1_000.0).abs() < EPS);
        assert!((c.viewport().start - 29_500.0).abs() < EPS);

        c.zoom(0.5, 1e6).expect("zoom out");
        assert_eq!(
            c.viewport(),
            Viewport {
                start: 0.0,
                end: 60_000.0
            }
        );
        assert!(!c.zoom(0.5, 2.0).expect("already full"));
    }

    #[test]
    fn malformed_zoom_is_a_configuration_error() {
        let mut c = controller();
        assert_eq!(c.zoom(0.5, 0.0), Err(ConfigurationError::InvalidZoomFactor(0.0)));
        assert_eq!(c.zoom(0.5, -2.0), Err(ConfigurationError::InvalidZoomFactor(-2.0)));
        assert!(c.zoom(0.5, f64::INFINITY).is_err());
        assert!(c.zoom(f64::NAN, 0.5).is_err());
        assert_eq!(c.viewport().duration(), 60_000.0);
    }

    #[test]
    fn anchor_outside_unit_range_is_clamped() {
        let mut c = controller();
        c.zoom(7.0, 0.5).expect("zoom");
        assert_eq!(c.viewport().end, 60_000.0);
        assert_eq!(c.viewport().start, 30_000.0);
    }

    #[test]
    fn construction_rejects_malformed_bounds() {
        assert!(matches!(
            ViewportController::new(0.0, 1.0),
            Err(ConfigurationError::NonPositiveTotalDuration(_))
        ));
        assert!(matches!(
            ViewportController::new(10.0, 0.0),
            Err(ConfigurationError::NonPositiveMinWindow(_))
        ));
        assert!(matches!(
            ViewportController::new(500.0, 1_000.0),
            Err(ConfigurationError::MinWindowExceedsTotal { .. })
        ));
        assert!(controller().with_zoom_step(0.0).is_err());
    }

    #[test]
    fn pan_translates_by_window_fraction() {
        let mut c = controller();
        c.set_window(10_000.0, 20_000.0).expect("window");
        assert!(c.pan(0.5).expect("pan"));
        assert_eq!(
            c.viewport(),
            Viewport {
                start: 15_000.0,
                end: 25_000.0
            }
        );
        assert!(c.pan(-1.5).expect("pan back"));
        assert_eq!(c.viewport().start, 0.0);
    }

    #[test]
    fn pan_past_the_edge_is_a_no_op() {
        let mut c = controller();
        c.set_window(5_000.0, 15_000.0).expect("window");
        assert!(!c.pan(-0.6).expect("pan"));
        assert_eq!(c.viewport().start, 5_000.0);

        assert!(!controller().pan(0.01).expect("full view cannot pan"));
        assert!(controller().pan(f64::NAN).is_err());
    }

    #[test]
    fn set_scale_leaves_the_window_alone() {
        let mut c = controller();
        c.zoom(0.5, 0.5).expect("zoom");
        let before = c.viewport();
        assert!(c.set_scale(TimeScale::Minute));
        assert!(!c.set_scale(TimeScale::Minute));
        assert_eq!(c.scale(), TimeScale::Minute);
        assert_eq!(c.viewport(), before);
    }

    #[test]
    fn center_on_keeps_zoom_for_short_items() {
        let mut c = controller();
        c.set_window(0.0, 10_000.0).expect("window");
        assert!(c.center_on(40_000.0, 42_000.0));
        assert_eq!(
            c.viewport(),
            Viewport {
                start: 36_000.0,
                end: 46_000.0
            }
        );
    }

    #[test]
    fn center_on_expands_for_long_items() {
        let mut c = controller();
        c.set_window(0.0, 10_000.0).expect("window");
        c.center_on(20_000.0, 45_000.0);
        assert_eq!(
            c.viewport(),
            Viewport {
                start: 20_000.0,
                end: 45_000.0
            }
        );

        c.center_on(58_000.0, 60_000.0);
        let v = c.viewport();
        assert!((v.end - 60_000.0).abs() < EPS, "shifted inside at the right edge");
        assert!((v.duration() - 25_000.0).abs() < EPS);
    }

    #[test]
    fn zoom_steps_are_reciprocal() {
        let mut c = controller().with_zoom_step(0.5).expect("step");
        c.zoom_in(0.5).expect("in");
        assert!((c.viewport().duration() - 30_000.0).abs() < EPS);
        c.zoom_out(0.5).expect("out");
        assert!((c.viewport().duration() - 60_000.0).abs() < EPS);
    }

    #[test]
    fn containment_holds_across_operation_sequences() {
        let mut state = 0x9e37_79b9_u64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 10_000) as f64 / 10_000.0
        };

        let mut c = controller();
        for _ in 0..2_000 {
            match (next() * 4.0) as u32 {
                0 => {
                    c.zoom(next(), 0.05 + next() * 3.0).expect("zoom");
                }
                1 => {
                    c.pan(next() * 2.0 - 1.0).expect("pan");
                }
                2 => {
                    let a = next() * 80_000.0 - 10_000.0;
                    c.center_on(a, a + next() * 30_000.0);
                }
                _ => {
                    let a = next() * 70_000.0 - 5_000.0;
                    c.set_window(a, a + next() * 20_000.0).expect("window");
                }
            }
            assert_contained(&c);
        }
    }

    #[test]
    fn percent_conversions_are_inverse() {
        let v = Viewport {
            start: 10_000.0,
            end: 30_000.0,
        };
        assert_eq!(v.ms_to_percent(15_000.0), 25.0);
        assert_eq!(v.percent_to_ms(25.0), 15_000.0);
    }
}
