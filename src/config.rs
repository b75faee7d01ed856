//! Run configuration.
//!
//! Handles loading, validating, and layering the settings for one batch run.
//! Layers are merged bottom-up, later layers overriding earlier ones key by key:
//!
//! ```text
//! stock defaults  →  --config FILE  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "~/Edge-detection/finished"  # $HOME-relative when HOME is set
//!
//! [threshold]
//! enabled = false     # classify pixels as edge / not edge
//! value = 0           # compared against the 0-255 rescaled magnitude;
//!                     # negative marks every pixel
//! binary = false      # pure white edges on black; needs enabled = true
//!
//! [processing]
//! max_threads = 4            # row workers (omit for auto = CPU cores)
//! progress_interval_ms = 1000
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Binary Without Threshold
//!
//! `binary = true` only has meaning together with `enabled = true`. The
//! combination is not an error: [`EdgeConfig::resolve`] drops back to the
//! plain intensity map and reports a [`ConfigNotice`] for the caller to print.

use crate::edges::RenderMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings for a batch run. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeConfig {
    /// Directory receiving the `<name>edge.<ext>` outputs. Created if absent.
    pub output_dir: PathBuf,
    /// Edge classification settings.
    pub threshold: ThresholdConfig,
    /// Worker pool and progress reporting settings.
    pub processing: ProcessingConfig,
}

/// `$HOME/Edge-detection/finished`, or the relative path when `HOME` is unset.
pub fn default_output_dir() -> PathBuf {
    let base = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    base.join("Edge-detection").join("finished")
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            threshold: ThresholdConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Thresholding switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    pub enabled: bool,
    /// Compared against the rescaled `0..=255` magnitude of each channel.
    /// Negative values make every pixel an edge.
    pub value: i32,
    pub binary: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of row workers per image.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
    /// How often row progress is printed while an image is being processed.
    pub progress_interval_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            progress_interval_ms: 1000,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Adjustments made while resolving a config, reported once before the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigNotice {
    BinaryWithoutThreshold,
}

impl fmt::Display for ConfigNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryWithoutThreshold => {
                write!(f, "binary mode needs a threshold; writing a plain edge map instead")
            }
        }
    }
}

/// Everything the batch driver needs, with policy decisions already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub mode: RenderMode,
    pub threads: usize,
    pub progress_interval: Duration,
    pub notices: Vec<ConfigNotice>,
}

impl EdgeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        if self.processing.progress_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "processing.progress_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Apply the binary-mode policy and derive the runtime settings.
    pub fn resolve(&self) -> RunSettings {
        let threshold = self.threshold.enabled.then_some(self.threshold.value);
        let (mode, downgraded) = RenderMode::from_flags(threshold, self.threshold.binary);

        let mut notices = Vec::new();
        if downgraded {
            notices.push(ConfigNotice::BinaryWithoutThreshold);
        }

        RunSettings {
            output_dir: self.output_dir.clone(),
            mode,
            threads: effective_threads(&self.processing),
            progress_interval: Duration::from_millis(self.processing.progress_interval_ms),
            notices,
        }
    }
}

/// Command-line values that override the loaded config when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    /// Setting a value also enables thresholding.
    pub threshold: Option<i32>,
    /// `true` turns binary mode on; `false` leaves the lower layers alone.
    pub binary: bool,
    pub threads: Option<usize>,
}

impl Overrides {
    /// The overrides as a sparse TOML table, ready for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::Table::new();
        let mut threshold = toml::Table::new();
        let mut processing = toml::Table::new();

        if let Some(dir) = &self.output_dir {
            root.insert(
                "output_dir".into(),
                toml::Value::String(dir.to_string_lossy().into_owned()),
            );
        }
        if let Some(value) = self.threshold {
            threshold.insert("enabled".into(), toml::Value::Boolean(true));
            threshold.insert("value".into(), toml::Value::Integer(i64::from(value)));
        }
        if self.binary {
            threshold.insert("binary".into(), toml::Value::Boolean(true));
        }
        if let Some(n) = self.threads {
            processing.insert(
                "max_threads".into(),
                toml::Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)),
            );
        }

        if !threshold.is_empty() {
            root.insert("threshold".into(), toml::Value::Table(threshold));
        }
        if !processing.is_empty() {
            root.insert("processing".into(), toml::Value::Table(processing));
        }
        toml::Value::Table(root)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EdgeConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge `layers` in order onto the stock defaults, then deserialize and validate.
pub fn resolve_layers(
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<EdgeConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value()?, merge_toml);
    let config: EdgeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config: defaults, then the optional file, then `overrides`.
pub fn load_config(file: Option<&Path>, overrides: &Overrides) -> Result<EdgeConfig, ConfigError> {
    let mut layers = Vec::new();
    if let Some(path) = file {
        layers.push(load_raw_config(path)?);
    }
    layers.push(overrides.to_toml());
    resolve_layers(layers)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# edgemap configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override this file.
# Unknown keys will cause an error.

# Where edge maps are written, as <name>edge.<ext>. Created if missing.
# Defaults to $HOME/Edge-detection/finished.
# output_dir = "/home/me/Edge-detection/finished"

# ---------------------------------------------------------------------------
# Thresholding
# ---------------------------------------------------------------------------
[threshold]
# Classify each pixel as edge or background. When false, the output is the
# plain edge-intensity map.
enabled = false

# A pixel is an edge when any channel of its rescaled (0-255) magnitude is
# strictly greater than this value. A negative value marks every pixel.
value = 0

# Render edges pure white and everything else pure black.
# Only honoured when enabled = true.
binary = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Row workers per image. Omit to use every CPU core.
# max_threads = 4

# Milliseconds between "Completed N rows" progress lines.
progress_interval_ms = 1000
"##
}
