//! TOML config file loading and validation for the dashboard.
//!
//! Every setting has a default matching the demo farm, so the binary runs
//! with no config file at all. A file only needs the keys it overrides.

use anyhow::{bail, Context, Result};
use palm_telemetry::MAX_BINS;
use serde::Deserialize;

/// Path consulted when `CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Hard ceiling on a single irrigation run.
const DURATION_LIMIT_MIN: u32 = 120;
/// Bounds on the per-run water volume. The web layer enforces the same
/// bounds on ad-hoc runs.
pub(crate) const VOLUME_RANGE_LITERS: (u32, u32) = (10, 1000);

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub farm: FarmSection,
    #[serde(default)]
    pub irrigation: IrrigationSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmSection {
    #[serde(default = "default_farm_name")]
    pub name: String,
    /// Number of palms the telemetry generator simulates.
    #[serde(default = "default_tree_count")]
    pub tree_count: u32,
    /// Optional generator seed. Set it to serve the same farm every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IrrigationSection {
    #[serde(default = "default_duration_min")]
    pub default_duration_min: u32,
    #[serde(default = "default_max_duration_min")]
    pub max_duration_min: u32,
    #[serde(default = "default_volume_liters")]
    pub default_volume_liters: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSection {
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_farm_name() -> String {
    "My Smart Farm".to_string()
}

fn default_tree_count() -> u32 {
    50
}

fn default_duration_min() -> u32 {
    30
}

fn default_max_duration_min() -> u32 {
    60
}

fn default_volume_liters() -> u32 {
    200
}

fn default_histogram_bins() -> usize {
    20
}

impl Default for FarmSection {
    fn default() -> Self {
        Self {
            name: default_farm_name(),
            tree_count: default_tree_count(),
            seed: None,
        }
    }
}

impl Default for IrrigationSection {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration_min(),
            max_duration_min: default_max_duration_min(),
            default_volume_liters: default_volume_liters(),
        }
    }
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.farm.name.trim().is_empty() {
            errors.push("farm.name is empty".to_string());
        }
        if self.farm.tree_count < 1 {
            errors.push("farm.tree_count must be at least 1".to_string());
        }

        let irrigation = &self.irrigation;
        if irrigation.default_duration_min < 1 {
            errors.push(format!(
                "irrigation.default_duration_min must be positive, got {}",
                irrigation.default_duration_min
            ));
        }
        if irrigation.max_duration_min > DURATION_LIMIT_MIN {
            errors.push(format!(
                "irrigation.max_duration_min {} exceeds the {DURATION_LIMIT_MIN} minute limit",
                irrigation.max_duration_min
            ));
        }
        if irrigation.default_duration_min > irrigation.max_duration_min {
            errors.push(format!(
                "irrigation.default_duration_min ({}) exceeds max_duration_min ({})",
                irrigation.default_duration_min, irrigation.max_duration_min
            ));
        }
        let (volume_min, volume_max) = VOLUME_RANGE_LITERS;
        if !(volume_min..=volume_max).contains(&irrigation.default_volume_liters) {
            errors.push(format!(
                "irrigation.default_volume_liters {} out of range [{volume_min}, {volume_max}]",
                irrigation.default_volume_liters
            ));
        }

        if self.dashboard.histogram_bins < 1 {
            errors.push("dashboard.histogram_bins must be at least 1".to_string());
        }
        if self.dashboard.histogram_bins > MAX_BINS {
            errors.push(format!(
                "dashboard.histogram_bins {} exceeds the {MAX_BINS} bucket limit",
                self.dashboard.histogram_bins
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Resolve the config for this run: `CONFIG_PATH` if set, otherwise
/// `config.toml` in the working directory, otherwise built-in defaults.
/// A path that is set but unreadable is an error, not a silent fallback.
pub fn load_or_default() -> Result<Config> {
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        return load(&path);
    }
    if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
        return load(DEFAULT_CONFIG_PATH);
    }
    tracing::info!("no config file found, using defaults");
    Ok(Config::default())
}

// ===========================================================================
// Tests
// ===========================================================================
