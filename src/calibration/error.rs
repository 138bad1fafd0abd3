// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with frequency-switch calibration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Calibration inputs have different lengths: expected {expected} channels, but {what} has {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("At least 2 channels are needed to calibrate, but got {0}")]
    TooFewChannels(usize),

    #[error("The frequency axis has a non-positive or non-finite channel step ({0} MHz)")]
    InvalidStep(f64),

    #[error("The frequency-switch shift is negative ({0} channels); is the frequency axis relative?")]
    NegativeShift(f64),

    #[error("Trimming {n_shift}+1 channels from each end of {num_channels} channels leaves nothing")]
    TrimTooLarge { n_shift: usize, num_channels: usize },

    #[error("The degrees-per-flux-unit factor must be non-zero and finite, but is {dpfu} at elevation {elevation}°")]
    InvalidDpfu { dpfu: f64, elevation: f64 },

    #[error("System temperatures must be positive and finite, but got {0} K")]
    InvalidTsys(f64),

    #[error("The {what} power is zero at channel {channel}")]
    ZeroPower { what: &'static str, channel: usize },
}
