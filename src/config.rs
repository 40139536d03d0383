//! Toolkit configuration: TOML file with environment overrides
//!
//! Every field has a default, so an empty file (or no file) is a valid configuration.
//! Environment variables override whatever the file says:
//!
//! | Variable | Field |
//! |---|---|
//! | `QR_BATCH_CONCURRENCY` | `batch.concurrency` |
//! | `QR_ITEM_TIMEOUT_MS` | `batch.item_timeout_ms` |
//! | `QR_SCAN_BUDGET_MS` | `scan.time_budget_ms` |
//! | `QR_MAX_REGIONS` | `scan.max_regions` |
//! | `QR_MIN_CONFIDENCE` | `scan.min_quality` |

use crate::error::ConfigError;
use crate::models::{Color, ECLevel, StyleSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Encoding defaults
    pub encode: EncodeConfig,
    /// Default colours
    pub style: StyleConfig,
    /// Single-image scanning
    pub scan: ScanConfig,
    /// Camera loop
    pub camera: CameraConfig,
    /// Batch coordinator
    pub batch: BatchConfig,
    /// Renderer
    pub render: RenderConfig,
}

/// Encoding defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Pixels per module
    pub module_size: u32,
    /// Quiet zone in modules
    pub border: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            ec_level: ECLevel::H,
            module_size: 10,
            border: 4,
        }
    }
}

/// Default colours as hex strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Dark module colour
    pub foreground: String,
    /// Light module colour
    pub background: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            foreground: "#000000".into(),
            background: "#FFFFFF".into(),
        }
    }
}

/// Single-image scanning limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Time allowed per image
    pub time_budget_ms: u64,
    /// Finder triads tried per image
    pub max_regions: usize,
    /// Results below this quality are dropped
    pub min_quality: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 2000,
            max_regions: 40,
            min_quality: 0.0,
        }
    }
}

/// Camera loop throttling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Scan every Nth frame
    pub frame_stride: usize,
    /// A payload is not re-emitted within this window
    pub suppression_window_ms: u64,
    /// The loop ends after this long
    pub session_timeout_secs: u64,
    /// Wider frames are downscaled before scanning
    pub max_frame_width: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_stride: 5,
            suppression_window_ms: 2000,
            session_timeout_secs: 30,
            max_frame_width: 800,
        }
    }
}

/// Batch defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count; `None` uses the available parallelism
    pub concurrency: Option<usize>,
    /// Per-item deadline
    pub item_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            item_timeout_ms: 30_000,
        }
    }
}

impl BatchConfig {
    /// Per-item deadline as a duration
    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }
}

/// Renderer overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Logo coverage warning threshold; `None` uses the level's recovery fraction
    pub logo_coverage_threshold: Option<f32>,
}

fn parse_env<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse::<T>().ok())
}

impl ToolkitConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text; missing sections and fields take defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup. Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = parse_env::<usize>(lookup("QR_BATCH_CONCURRENCY")) {
            self.batch.concurrency = Some(v);
        }
        if let Some(v) = parse_env::<u64>(lookup("QR_ITEM_TIMEOUT_MS")) {
            self.batch.item_timeout_ms = v;
        }
        if let Some(v) = parse_env::<u64>(lookup("QR_SCAN_BUDGET_MS")) {
            self.scan.time_budget_ms = v;
        }
        if let Some(v) = parse_env::<usize>(lookup("QR_MAX_REGIONS")) {
            self.scan.max_regions = v;
        }
        if let Some(v) = parse_env::<f32>(lookup("QR_MIN_CONFIDENCE")) {
            self.scan.min_quality = v;
        }
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.batch.concurrency == Some(0) {
            return invalid("batch.concurrency must be at least 1".into());
        }
        if self.encode.module_size == 0 {
            return invalid("encode.module_size must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.scan.min_quality) {
            return invalid(format!("scan.min_quality {} outside 0..1", self.scan.min_quality));
        }
        if self.camera.frame_stride == 0 {
            return invalid("camera.frame_stride must be at least 1".into());
        }
        if let Some(t) = self.render.logo_coverage_threshold {
            if !(0.0..=1.0).contains(&t) {
                return invalid(format!("render.logo_coverage_threshold {t} outside 0..1"));
            }
        }
        Color::from_hex(&self.style.foreground).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Color::from_hex(&self.style.background).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Style built from the configured colours and logo threshold
    pub fn style(&self) -> Result<StyleSpec, ConfigError> {
        let fg = Color::from_hex(&self.style.foreground)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let bg = Color::from_hex(&self.style.background)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let mut style = StyleSpec::colors(fg, bg);
        style.logo_coverage_threshold = self.render.logo_coverage_threshold;
        Ok(style)
    }
}
