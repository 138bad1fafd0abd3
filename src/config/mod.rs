// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The pipeline configuration: per-site antenna constants, per-source SNR
//! exclusion windows ("cuts"), the rest-frequency table and cleaning
//! parameters.
//!
//! ```toml
//! [cleaning]
//! smoothing_window = 5
//!
//! [sites.IRBENE]
//! dpfu_max = [0.0387, 0.0264]
//! gain_elevation = [-1.3e-5, 1.0e-3, 0.98]
//! tcal = 3.0
//! k = 1.0
//!
//! [cuts]
//! cepa = [[0.2, 0.4], [0.9, 1.1]]
//!
//! [rest_frequencies]
//! "CH3OH 6.7 GHz" = 6668519200.0
//! ```

mod error;
#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use crate::{constants::DEFAULT_SMOOTHING_WINDOW, doppler::RestFrequencyTable};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub cleaning: CleaningConfig,

    /// Antenna constants, keyed by station name.
    #[serde(default)]
    pub sites: IndexMap<String, SiteConstants>,

    /// SNR exclusion windows on a pair's trimmed relative frequency axis
    /// \[MHz\], keyed by source name.
    #[serde(default)]
    pub cuts: IndexMap<String, Vec<[f64; 2]>>,

    /// Known transitions \[Hz\], keyed by species label.
    #[serde(default)]
    pub rest_frequencies: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
    /// The rolling-mean window used to replace outliers \[channels\].
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

fn default_smoothing_window() -> usize {
    DEFAULT_SMOOTHING_WINDOW
}

impl Default for CleaningConfig {
    fn default() -> Self {
        CleaningConfig {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

/// The constants of a single antenna.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConstants {
    /// Maximum degrees-per-flux-unit values (one per polarisation); their mean
    /// is used \[K/Jy\].
    pub dpfu_max: Vec1<f64>,

    /// Gain-versus-elevation polynomial, highest power first (elevation in
    /// degrees).
    pub gain_elevation: Vec1<f64>,

    /// Temperature of the calibration noise diode \[K\]. Informational only.
    #[serde(default)]
    pub tcal: f64,

    /// Extra scaling applied after the Kelvin-to-Jansky conversion.
    #[serde(default = "default_k")]
    pub k: f64,
}

fn default_k() -> f64 {
    1.0
}

impl SiteConstants {
    fn validate(&self, site: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSite {
            site: site.to_string(),
            reason,
        };
        if self.dpfu_max.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(invalid(format!(
                "dpfu_max values must be positive, but got {:?}",
                self.dpfu_max
            )));
        }
        if self.gain_elevation.iter().any(|g| !g.is_finite()) {
            return Err(invalid("gain_elevation has a non-finite coefficient".to_string()));
        }
        if !self.k.is_finite() || self.k == 0.0 {
            return Err(invalid(format!("k must be non-zero, but got {}", self.k)));
        }
        Ok(())
    }
}

impl PipelineConfig {
    pub fn from_file(file: &Path) -> Result<PipelineConfig, ConfigError> {
        debug!("Reading config {}", file.display());
        let contents = std::fs::read_to_string(file).map_err(|err| ConfigError::Open {
            file: file.display().to_string(),
            err,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<PipelineConfig, ConfigError> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cleaning.smoothing_window == 0 {
            return Err(ConfigError::InvalidSmoothingWindow);
        }
        for (site, constants) in &self.sites {
            constants.validate(site)?;
        }
        for (source, windows) in &self.cuts {
            for &[low, high] in windows {
                if low.is_nan() || high.is_nan() || low > high {
                    return Err(ConfigError::InvalidCut {
                        source_name: source.clone(),
                        low,
                        high,
                    });
                }
            }
        }
        for (label, &value) in &self.rest_frequencies {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidRestFrequency {
                    label: label.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Get a site's constants. Station names are matched case-insensitively
    /// if there's no exact match.
    pub fn site(&self, name: &str) -> Result<&SiteConstants, ConfigError> {
        self.sites
            .get(name)
            .or_else(|| {
                self.sites
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| ConfigError::UnknownSite {
                site: name.to_string(),
                available: self.sites.keys().join(", "),
            })
    }

    /// The SNR exclusion windows of a source. A source without an entry has
    /// none.
    pub fn cuts(&self, source: &str) -> &[[f64; 2]] {
        self.cuts.get(source).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn rest_frequency_table(&self) -> Result<RestFrequencyTable, ConfigError> {
        let entries = self
            .rest_frequencies
            .iter()
            .map(|(label, &hz)| (label.clone(), hz))
            .collect::<Vec<_>>();
        let entries = Vec1::try_from_vec(entries).map_err(|_| ConfigError::NoRestFrequencies)?;
        Ok(RestFrequencyTable::new(entries))
    }
}
