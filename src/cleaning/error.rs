// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with cleaning spectra.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("The outlier threshold must be positive and finite, but got {0}")]
    InvalidThreshold(f64),

    #[error("The smoothing window must be at least 1 channel")]
    InvalidSmoothingWindow,

    #[error("The frequency axis and amplitudes have different lengths ({x} vs. {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("Channel {index} is out of range; there are {num_channels} channels")]
    IndexOutOfRange { index: usize, num_channels: usize },

    #[error("A polynomial of order {order} needs at least {needed} neighbouring channels, but only {available} are within {half_window} channels of channel {index}")]
    TooFewNeighbours {
        index: usize,
        half_window: usize,
        order: usize,
        needed: usize,
        available: usize,
    },

    #[error("The polynomial fit around channel {index} is singular")]
    SingularFit { index: usize },
}
