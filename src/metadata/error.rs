// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with experiment-log metadata.

use thiserror::Error;

use crate::{polarisation::Polarisation, sexagesimal::SexagesimalError};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Couldn't read experiment log '{file}': {err}")]
    Open { file: String, err: std::io::Error },

    #[error("Couldn't decode the experiment log: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The experiment log has no 'header' entry")]
    MissingHeader,

    #[error("The experiment log's header is malformed: {0}")]
    InvalidHeader(serde_json::Error),

    #[error("Scan {scan} is malformed in the experiment log: {err}")]
    InvalidScan {
        scan: String,
        err: serde_json::Error,
    },

    #[error("Scan {scan} isn't in the experiment log")]
    MissingScan { scan: String },

    #[error("Scan {scan} has an invalid {pol} system temperature ({value} K) and no valid substitute was supplied")]
    InvalidTsys {
        scan: String,
        pol: Polarisation,
        value: f64,
    },

    #[error("A substitute {pol} system temperature for scan {scan} must be within (0, {max}] K, but got {value} K")]
    InvalidSubstituteTsys {
        scan: String,
        pol: Polarisation,
        value: f64,
        max: f64,
    },

    #[error("Couldn't read the system temperature from the prompt: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("Scan {scan} has an unparsable date/time '{value}'")]
    InvalidTime { scan: String, value: String },

    #[error("Scan {scan} has an invalid position: {err}")]
    InvalidPosition {
        scan: String,
        err: SexagesimalError,
    },

    #[error("At least two distinct fs_frequencyfs values are needed to determine the frequency start, but the experiment log has {0}")]
    TooFewFrequencies(usize),

    #[error("The experiment log has no scans")]
    NoScans,
}
