// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all fscal-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::calibrate::CalibrateArgsError;
use crate::{
    calibration::CalibrationError,
    cleaning::CleaningError,
    config::ConfigError,
    doppler::EphemerisError,
    io::{read::ScanReadError, GlobError},
    metadata::MetadataError,
    result::{ResultReadError, ResultWriteError},
    session::SessionError,
};

const README: &str = "README.md";

/// The *only* publicly visible error from fscal. Each error message should
/// point at a section of the README, unless it's "generic".
#[derive(Error, Debug)]
pub enum FscalError {
    /// An error related to calibrate arguments.
    #[error("{0}\n\nSee `fscal calibrate --help` and the \"Usage\" section of {README}")]
    Calibrate(String),

    /// An error related to scan files.
    #[error("{0}\n\nSee for more info: the \"Scan files\" section of {README}")]
    ScanFile(String),

    /// An error related to the experiment log.
    #[error("{0}\n\nSee for more info: the \"Experiment logs\" section of {README}")]
    ExperimentLog(String),

    /// An error related to the pipeline configuration.
    #[error("{0}\n\nSee for more info: the \"Configuration\" section of {README}")]
    Config(String),

    /// An error from cleaning or calibrating a pair.
    #[error("{0}\n\nSee for more info: the \"Calibration\" section of {README}")]
    Calibration(String),

    /// An error related to the ephemeris program.
    #[error("{0}\n\nSee for more info: the \"Velocity correction\" section of {README}")]
    Ephemeris(String),

    /// An error related to result files.
    #[error("{0}\n\nSee for more info: the \"Results\" section of {README}")]
    Result(String),

    /// An error related to argument files.
    #[error("{0}\n\nSee for more info: the \"Argument files\" section of {README}")]
    ArgFile(String),

    /// A generic error that can't be clarified further with documentation, e.g.
    /// IO errors.
    #[error("{0}")]
    Generic(String),
}

// Binary sub-command errors.

impl From<CalibrateArgsError> for FscalError {
    fn from(e: CalibrateArgsError) -> Self {
        let s = e.to_string();
        match e {
            CalibrateArgsError::NoDataDir
            | CalibrateArgsError::NoSource
            | CalibrateArgsError::NoIteration
            | CalibrateArgsError::NoLog
            | CalibrateArgsError::ConflictingTsys
            | CalibrateArgsError::ConflictingVelocity => Self::Calibrate(s),
            CalibrateArgsError::NoConfig => Self::Config(s),
            CalibrateArgsError::SessionDirMissing(_) => Self::ScanFile(s),
        }
    }
}

// Library code errors.

impl From<SessionError> for FscalError {
    fn from(e: SessionError) -> Self {
        let s = e.to_string();
        match e {
            SessionError::PairIndexOutOfRange { .. }
            | SessionError::PairAlreadyProcessed(_)
            | SessionError::Finalized
            | SessionError::AlreadyFinalized
            | SessionError::PairsPending(_) => Self::Generic(s),
            SessionError::NoPairs | SessionError::ScanNumber(_) => Self::ScanFile(s),
            SessionError::DimensionMismatch { .. } => Self::Calibration(s),
            SessionError::Glob(e) => Self::from(e),
            SessionError::ScanRead(e) => Self::from(e),
            SessionError::Metadata(e) => Self::from(e),
            SessionError::Cleaning(e) => Self::from(e),
            SessionError::Calibration(e) => Self::from(e),
            SessionError::Ephemeris(e) => Self::from(e),
        }
    }
}

impl From<ScanReadError> for FscalError {
    fn from(e: ScanReadError) -> Self {
        Self::ScanFile(e.to_string())
    }
}

impl From<MetadataError> for FscalError {
    fn from(e: MetadataError) -> Self {
        let s = e.to_string();
        match e {
            MetadataError::Prompt(e) => Self::from(e),
            _ => Self::ExperimentLog(s),
        }
    }
}

impl From<CleaningError> for FscalError {
    fn from(e: CleaningError) -> Self {
        Self::Calibration(e.to_string())
    }
}

impl From<CalibrationError> for FscalError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e.to_string())
    }
}

impl From<EphemerisError> for FscalError {
    fn from(e: EphemerisError) -> Self {
        Self::Ephemeris(e.to_string())
    }
}

impl From<ConfigError> for FscalError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<ResultReadError> for FscalError {
    fn from(e: ResultReadError) -> Self {
        let s = e.to_string();
        match e {
            ResultReadError::Magic { .. }
            | ResultReadError::Version { .. }
            | ResultReadError::Species { .. }
            | ResultReadError::Truncated { .. } => Self::Result(s),
            ResultReadError::IO(e) => Self::from(e),
        }
    }
}

impl From<ResultWriteError> for FscalError {
    fn from(e: ResultWriteError) -> Self {
        let s = e.to_string();
        match e {
            ResultWriteError::BadShape { .. } => Self::Result(s),
            ResultWriteError::IO(e) => Self::from(e),
        }
    }
}

impl From<GlobError> for FscalError {
    fn from(e: GlobError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for FscalError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
