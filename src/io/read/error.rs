// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading raw scan files.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanReadError {
    #[error("Couldn't read scan file '{file}': {err}")]
    Open { file: String, err: std::io::Error },

    #[error("{file} line {line}: couldn't parse '{value}' as a number")]
    ParseValue {
        file: String,
        line: usize,
        value: String,
    },

    #[error("{file} line {line}: expected {expected} columns, but found {actual}")]
    ColumnCount {
        file: String,
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{file}: expected at least {expected} rows (including the header row), but found {actual}")]
    TooFewRows {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("{file}: the frequency axis isn't strictly increasing at channel {channel}")]
    NonMonotonicFreqs { file: String, channel: usize },

    #[error("The signal and reference scans have different shapes: {signal} vs. {reference} channels; refusing to truncate")]
    DimensionMismatch { signal: usize, reference: usize },

    #[error("The signal and reference scans have different frequency axes (first difference at channel {channel})")]
    FreqMismatch { channel: usize },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
