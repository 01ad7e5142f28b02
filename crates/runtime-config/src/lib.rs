//! `stepline.toml` configuration.
//!
//! Every field is optional; missing sections and keys fall back to the
//! engine defaults. Front-ends load the file once and hand the resulting
//! [`EngineConfig`] to the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stepline_core::EngineConfig;
use stepline_core::TimeScale;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "stepline.toml";

/// Environment variable naming a config file to use instead of defaults.
pub const CONFIG_ENV_VAR: &str = "STEPLINE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level configuration (persisted as `stepline.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepLineConfig {
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub markers: MarkerSettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    #[serde(default = "default_min_window_ms")]
    pub min_window_ms: f64,
    /// Factor applied by one zoom-in notch; zoom out uses the reciprocal.
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    #[serde(default = "default_pan_step")]
    pub pan_step: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_window_ms: default_min_window_ms(),
            zoom_step: default_zoom_step(),
            pan_step: default_pan_step(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSettings {
    #[serde(default = "default_density_cap")]
    pub density_cap: usize,
    #[serde(default)]
    pub default_scale: TimeScale,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            density_cap: default_density_cap(),
            default_scale: TimeScale::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightSettings {
    /// Gap on the same lane still treated as adjacent. 0 = touching.
    #[serde(default)]
    pub adjacency_tolerance_ms: i64,
}

impl StepLineConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_window_ms: self.viewport.min_window_ms,
            zoom_step: self.viewport.zoom_step,
            pan_step: self.viewport.pan_step,
            density_cap: self.markers.density_cap,
            default_scale: self.markers.default_scale,
            adjacency_tolerance_ms: self.highlight.adjacency_tolerance_ms,
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_min_window_ms() -> f64 {
    stepline_core::viewport::DEFAULT_MIN_WINDOW_MS
}
fn default_zoom_step() -> f64 {
    stepline_core::viewport::DEFAULT_ZOOM_STEP
}
fn default_pan_step() -> f64 {
    stepline_core::viewport::DEFAULT_PAN_STEP
}
fn default_density_cap() -> usize {
    stepline_core::markers::DEFAULT_DENSITY_CAP
}

/// Repair values the engine would reject after loading raw TOML.
/// Returns true when any field was updated.
pub fn apply_fallbacks(config: &mut StepLineConfig) -> bool {
    let mut changed = false;

    let viewport = &mut config.viewport;
    if !viewport.min_window_ms.is_finite() || viewport.min_window_ms <= 0.0 {
        viewport.min_window_ms = default_min_window_ms();
        changed = true;
    }
    if !is_unit_fraction(viewport.zoom_step) {
        viewport.zoom_step = default_zoom_step();
        changed = true;
    }
    if !is_unit_fraction(viewport.pan_step) {
        viewport.pan_step = default_pan_step();
        changed = true;
    }
    if config.markers.density_cap == 0 {
        config.markers.density_cap = default_density_cap();
        changed = true;
    }
    if config.highlight.adjacency_tolerance_ms < 0 {
        config.highlight.adjacency_tolerance_ms = 0;
        changed = true;
    }

    if changed {
        tracing::warn!("config contained unusable values; defaults applied");
    }
    changed
}

fn is_unit_fraction(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value < 1.0
}

/// Load config from `path`, returning defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<StepLineConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(StepLineConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: StepLineConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    apply_fallbacks(&mut config);
    Ok(config)
}

/// Write the canonical TOML form of `config` to `path`.
pub fn save_config(path: &Path, config: &StepLineConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
