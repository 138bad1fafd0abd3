// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with processing a session of scan pairs.

use thiserror::Error;

use crate::{
    calibration::CalibrationError, cleaning::CleaningError, doppler::EphemerisError,
    io::read::ScanReadError, io::GlobError, metadata::MetadataError,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Pair {index} doesn't exist; there are {num_pairs} pairs")]
    PairIndexOutOfRange { index: usize, num_pairs: usize },

    #[error("Pair {0} has already been processed")]
    PairAlreadyProcessed(usize),

    #[error("The session has been finalised; no more pairs can be processed")]
    Finalized,

    #[error("The session has already been finalised; its result has already been averaged")]
    AlreadyFinalized,

    #[error("Cannot finalise the session while pairs {0:?} are unprocessed")]
    PairsPending(Vec<usize>),

    #[error("The session has no scan pairs")]
    NoPairs,

    #[error("Couldn't get a scan number from the file name '{0}'")]
    ScanNumber(String),

    #[error("Pair {pair} has {actual} calibrated channels, but earlier pairs have {expected}; refusing to average")]
    DimensionMismatch {
        pair: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    ScanRead(#[from] ScanReadError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Cleaning(#[from] CleaningError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}
