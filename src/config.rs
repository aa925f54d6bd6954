use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::DEFAULT_HEADER_SKIP_ROWS;
use crate::data::model::TimeUnit;
use crate::data::stats::RatioChannels;
use crate::data::units::ConcentrationUnit;

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "FRET_WRANGLER_CONFIG";
/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "fret-wrangler.json";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Instrument and experiment defaults.
///
/// ```json
/// {
///   "header_skip_rows": 4,
///   "ratio_channels": {
///     "numerator": "Raw Data (337/665 A)",
///     "denominator": "Raw Data (337/620 B)"
///   },
///   "default_concentration_unit": "nanomolar",
///   "default_time_unit": "seconds"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub header_skip_rows: usize,
    pub ratio_channels: RatioChannels,
    pub default_concentration_unit: ConcentrationUnit,
    pub default_time_unit: TimeUnit,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_skip_rows: DEFAULT_HEADER_SKIP_ROWS,
            ratio_channels: RatioChannels::default(),
            default_concentration_unit: ConcentrationUnit::Nanomolar,
            default_time_unit: TimeUnit::Seconds,
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Resolve settings from `$FRET_WRANGLER_CONFIG`, then `./fret-wrangler.json`,
    /// falling back to defaults. A file that exists but cannot be read is
    /// logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(CONFIG_FILE)).filter(|p| p.exists()));

        match path {
            Some(path) => Self::from_path(&path).unwrap_or_else(|e| {
                log::warn!("Using default settings: {e:#}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
