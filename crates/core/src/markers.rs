use crate::error::{ConfigurationError, ensure_finite};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default upper bound on markers inside one viewport.
pub const DEFAULT_DENSITY_CAP: usize = 12;

/// Marker granularity, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    #[default]
    Second,
    TenSeconds,
    Minute,
    FiveMinutes,
    Hour,
}

impl TimeScale {
    pub const ORDER: [Self; 5] = [
        Self::Second,
        Self::TenSeconds,
        Self::Minute,
        Self::FiveMinutes,
        Self::Hour,
    ];

    pub fn tick_ms(self) -> i64 {
        match self {
            Self::Second => 1_000,
            Self::TenSeconds => 10_000,
            Self::Minute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::Hour => 3_600_000,
        }
    }

    pub fn coarser(self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::TenSeconds => "ten_seconds",
            Self::Minute => "minute",
            Self::FiveMinutes => "five_minutes",
            Self::Hour => "hour",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "second" | "1s" => Ok(Self::Second),
            "ten_seconds" | "10s" => Ok(Self::TenSeconds),
            "minute" | "1m" => Ok(Self::Minute),
            "five_minutes" | "5m" => Ok(Self::FiveMinutes),
            "hour" | "1h" => Ok(Self::Hour),
            other => Err(format!("unknown time scale: {other}")),
        }
    }
}

/// A labeled tick, positioned as a percentage of the viewport width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMarker {
    pub position: f64,
    pub label: String,
    #[serde(rename = "timeMs")]
    pub time_ms: f64,
}

/// Evenly spaced markers for one viewport.
///
/// The plan is computed eagerly but markers are produced lazily; iterating
/// the same plan again yields the same sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Markers {
    scale: TimeScale,
    step_ms: f64,
    /// First tick as a multiple of `step_ms`.
    first_tick: f64,
    count: usize,
    viewport_start: f64,
    viewport_end: f64,
}

impl Markers {
    /// Scale actually used, after any density fallback.
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Spacing between consecutive markers in milliseconds.
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    pub fn iter(&self) -> MarkerIter {
        MarkerIter {
            plan: *self,
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a Markers {
    type Item = TimeMarker;
    type IntoIter = MarkerIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct MarkerIter {
    plan: Markers,
    next: usize,
}

impl Iterator for MarkerIter {
    type Item = TimeMarker;

    fn next(&mut self) -> Option<TimeMarker> {
        let viewport = Viewport {
            start: self.plan.viewport_start,
            end: self.plan.viewport_end,
        };
        while self.next < self.plan.count {
            let time_ms = (self.plan.first_tick + self.next as f64) * self.plan.step_ms;
            self.next += 1;
            let position = viewport.ms_to_percent(time_ms);
            if !(0.0..=100.0).contains(&position) {
                continue;
            }
            return Some(TimeMarker {
                position,
                label: format_offset(time_ms, self.plan.scale),
                time_ms,
            });
        }
        None
    }
}

/// Markers for the viewport using [`DEFAULT_DENSITY_CAP`].
pub fn generate_markers(
    total_duration_ms: f64,
    scale: TimeScale,
    viewport_start: f64,
    viewport_end: f64,
) -> Result<Markers, ConfigurationError> {
    generate_markers_capped(
        total_duration_ms,
        scale,
        viewport_start,
        viewport_end,
        DEFAULT_DENSITY_CAP,
    )
}

/// Markers for the viewport, never more than `density_cap` of them.
///
/// Starting at `scale`, the first scale whose ticks fit under the cap wins.
/// If even the coarsest scale overflows, every n-th coarsest tick is kept.
pub fn generate_markers_capped(
    total_duration_ms: f64,
    scale: TimeScale,
    viewport_start: f64,
    viewport_end: f64,
    density_cap: usize,
) -> Result<Markers, ConfigurationError> {
    let total = ensure_finite("total duration", total_duration_ms)?;
    if total <= 0.0 {
        return Err(ConfigurationError::NonPositiveTotalDuration(total));
    }
    let start = ensure_finite("viewport start", viewport_start)?;
    let end = ensure_finite("viewport end", viewport_end)?;
    if end <= start {
        return Err(ConfigurationError::EmptyViewport { start, end });
    }
    if density_cap == 0 {
        return Err(ConfigurationError::ZeroDensityCap);
    }

    // Ticks exist only inside both the viewport and the timeline.
    let lo = start.max(0.0);
    let hi = end.min(total);

    let mut chosen = scale;
    loop {
        let step = chosen.tick_ms() as f64;
        let (first_tick, count) = tick_range(lo, hi, step);
        if count <= density_cap as f64 {
            return Ok(Markers {
                scale: chosen,
                step_ms: step,
                first_tick,
                count: count as usize,
                viewport_start: start,
                viewport_end: end,
            });
        }
        match chosen.coarser() {
            Some(next) => chosen = next,
            None => {
                let stride = (count / density_cap as f64).ceil();
                let step = step * stride;
                let (first_tick, count) = tick_range(lo, hi, step);
                return Ok(Markers {
                    scale: chosen,
                    step_ms: step,
                    first_tick,
                    // rounding at extreme magnitudes can add a tick
                    count: (count as usize).min(density_cap),
                    viewport_start: start,
                    viewport_end: end,
                });
            }
        }
    }
}

/// First tick multiple and tick count inside `[lo, hi]`, in f64 so huge
/// timelines cannot overflow.
fn tick_range(lo: f64, hi: f64, step: f64) -> (f64, f64) {
    if hi < lo {
        return (0.0, 0.0);
    }
    let first = (lo / step).ceil();
    let last = (hi / step).floor();
    (first, (last - first + 1.0).max(0.0))
}

/// Label for an offset from the timeline origin, precise to the scale.
pub fn format_offset(time_ms: f64, scale: TimeScale) -> String {
    let total_secs = (time_ms / 1_000.0).round() as i64;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    match scale {
        TimeScale::Second | TimeScale::TenSeconds => {
            if total_secs < 60 {
                format!("{total_secs}s")
            } else if hours == 0 {
                format!("{minutes}:{seconds:02}")
            } else {
                format!("{hours}:{minutes:02}:{seconds:02}")
            }
        }
        TimeScale::Minute | TimeScale::FiveMinutes => {
            if hours == 0 {
                format!("{minutes}m")
            } else {
                format!("{hours}h {minutes:02}m")
            }
        }
        TimeScale::Hour => format!("{hours}h"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(markers: &Markers) -> Vec<TimeMarker> {
        markers.iter().collect()
    }

    #[test]
    fn ten_second_window_uses_requested_scale() {
        let markers = generate_markers(60_000.0, TimeScale::Second, 0.0, 10_000.0).expect("markers");
        let out = collect(&markers);
        assert_eq!(markers.scale(), TimeScale::Second);
        assert_eq!(out.len(), 11);
        assert_eq!(out[0].position, 0.0);
        assert_eq!(out[0].label, "0s");
        assert_eq!(out[10].position, 100.0);
        assert_eq!(out[5].label, "5s");
    }

    #[test]
    fn overflowing_scale_falls_back_to_coarser() {
        let markers = generate_markers(60_000.0, TimeScale::Second, 0.0, 60_000.0).expect("markers");
        assert_eq!(markers.scale(), TimeScale::TenSeconds);
        let labels: Vec<String> = markers.iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["0s", "10s", "20s", "30s", "40s", "50s", "1:00"]);
    }

    #[test]
    fn coarser_request_is_kept() {
        let markers = generate_markers(600_000.0, TimeScale::Minute, 0.0, 600_000.0).expect("markers");
        assert_eq!(markers.scale(), TimeScale::Minute);
        assert_eq!(markers.len(), 11);
        let last = markers.iter().last().expect("marker");
        assert_eq!(last.label, "10m");
    }

    #[test]
    fn positions_are_relative_to_viewport() {
        let markers = generate_markers(60_000.0, TimeScale::Second, 15_500.0, 19_500.0).expect("markers");
        let out = collect(&markers);
        let times: Vec<f64> = out.iter().map(|m| m.time_ms).collect();
        assert_eq!(times, vec![16_000.0, 17_000.0, 18_000.0, 19_000.0]);
        assert!((out[0].position - 12.5).abs() < 1e-9);
        assert!((out[3].position - 87.5).abs() < 1e-9);
    }

    #[test]
    fn ticks_past_the_timeline_end_are_omitted() {
        let markers = generate_markers(5_000.0, TimeScale::Second, 0.0, 10_000.0).expect("markers");
        let last = markers.iter().last().expect("marker");
        assert_eq!(last.time_ms, 5_000.0);
        assert_eq!(last.position, 50.0);
    }

    #[test]
    fn sequence_is_restartable() {
        let markers = generate_markers(60_000.0, TimeScale::Second, 0.0, 8_000.0).expect("markers");
        let first: Vec<TimeMarker> = markers.iter().collect();
        let second: Vec<TimeMarker> = (&markers).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn density_cap_holds_everywhere() {
        let totals = [1_000.0, 59_000.0, 3_600_000.0, 86_400_000.0 * 7.0];
        for total in totals {
            for scale in TimeScale::ORDER {
                for cap in [1usize, 3, 12] {
                    let mut start = 0.0;
                    while start < total {
                        for width in [1_000.0, total / 3.0, total] {
                            let end = start + width;
                            let markers =
                                generate_markers_capped(total, scale, start, end, cap).expect("markers");
                            assert!(
                                markers.len() <= cap,
                                "total {total} scale {scale} cap {cap} [{start}, {end}] -> {}",
                                markers.len()
                            );
                        }
                        start += total / 5.0;
                    }
                }
            }
        }
    }

    #[test]
    fn extreme_totals_stay_under_the_cap() {
        for total in [1e19, 1e22, 1e300] {
            let markers = generate_markers(total, TimeScale::Second, 0.0, total).expect("markers");
            assert_eq!(markers.scale(), TimeScale::Hour);
            let out = collect(&markers);
            assert!(!out.is_empty(), "total {total}");
            assert!(out.len() <= DEFAULT_DENSITY_CAP, "total {total} -> {}", out.len());
            assert!(out.iter().all(|m| (0.0..=100.0).contains(&m.position)));
        }

        let far = generate_markers(1e22, TimeScale::Second, 1e22 - 1e9, 1e22).expect("markers");
        assert!(far.len() <= DEFAULT_DENSITY_CAP);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            generate_markers(0.0, TimeScale::Second, 0.0, 1.0),
            Err(ConfigurationError::NonPositiveTotalDuration(_))
        ));
        assert!(matches!(
            generate_markers(10.0, TimeScale::Second, 5.0, 5.0),
            Err(ConfigurationError::EmptyViewport { .. })
        ));
        assert!(matches!(
            generate_markers_capped(10.0, TimeScale::Second, 0.0, 5.0, 0),
            Err(ConfigurationError::ZeroDensityCap)
        ));
        assert!(matches!(
            generate_markers(10.0, TimeScale::Second, f64::NAN, 5.0),
            Err(ConfigurationError::NonFinite { .. })
        ));
    }

    #[test]
    fn labels_follow_scale_precision() {
        assert_eq!(format_offset(90_000.0, TimeScale::Second), "1:30");
        assert_eq!(format_offset(3_723_000.0, TimeScale::TenSeconds), "1:02:03");
        assert_eq!(format_offset(300_000.0, TimeScale::FiveMinutes), "5m");
        assert_eq!(format_offset(5_400_000.0, TimeScale::Minute), "1h 30m");
        assert_eq!(format_offset(7_200_000.0, TimeScale::Hour), "2h");
    }

    #[test]
    fn scale_parses_aliases() {
        assert_eq!("5m".parse::<TimeScale>(), Ok(TimeScale::FiveMinutes));
        assert_eq!("HOUR".parse::<TimeScale>(), Ok(TimeScale::Hour));
        assert!("fortnight".parse::<TimeScale>().is_err());
    }
}
