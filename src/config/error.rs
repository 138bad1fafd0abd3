// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the pipeline configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read config file '{file}': {err}")]
    Open { file: String, err: std::io::Error },

    #[error("Couldn't decode the config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Site '{site}' isn't in the config; available sites: {available}")]
    UnknownSite { site: String, available: String },

    #[error("Site '{site}' is invalid: {reason}")]
    InvalidSite { site: String, reason: String },

    #[error("Source '{source_name}' has an invalid SNR exclusion window [{low}, {high}]; the low bound must not exceed the high bound")]
    InvalidCut {
        source_name: String,
        low: f64,
        high: f64,
    },

    #[error("Rest frequency '{label}' must be positive and finite, but got {value} Hz")]
    InvalidRestFrequency { label: String, value: f64 },

    #[error("The config has no rest frequencies; at least one is needed to identify the species")]
    NoRestFrequencies,

    #[error("The smoothing window must be at least 1 channel")]
    InvalidSmoothingWindow,
}
