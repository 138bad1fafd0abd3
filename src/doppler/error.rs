// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with velocity corrections.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("Couldn't get the current directory: {0}")]
    CurrentDir(std::io::Error),

    #[error("Couldn't run the ephemeris program '{program}': {err}")]
    Spawn { program: String, err: std::io::Error },

    #[error("The ephemeris program '{program}' failed ({status})")]
    NonZeroExit { program: String, status: String },

    #[error("Couldn't read the ephemeris output '{file}': {err}")]
    ReadOutput { file: String, err: std::io::Error },

    #[error("The ephemeris output has no '{0}' entry")]
    MissingField(&'static str),

    #[error("The ephemeris output's '{key}' entry isn't a number: '{value}'")]
    ParseField { key: String, value: String },
}
