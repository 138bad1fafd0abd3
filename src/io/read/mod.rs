// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read raw frequency-switched scans.
//!
//! Each scan is a whitespace-separated ASCII table with 9 columns and one row
//! per frequency channel. The first row is an instrument artifact and is
//! always discarded. Column 0 is the (relative) frequency axis \[MHz\], columns
//! 1 and 2 are the "u1" and "u9" polarisation amplitudes.

mod error;
#[cfg(test)]
mod tests;

pub use error::ScanReadError;

use std::path::Path;

use log::{debug, trace};
use ndarray::prelude::*;

use crate::{
    constants::{FREQ_COLUMN, NUM_SCAN_COLUMNS},
    polarisation::Polarisation,
};

/// A single raw scan, less its header-artifact row.
#[derive(Debug, Clone)]
pub struct RawScan {
    /// The raw table. Dimensions are (num_channels, 9).
    data: Array2<f64>,
}

impl RawScan {
    /// Wrap an already-read table (e.g. from a test or another reader). The
    /// table must *not* contain the header-artifact row.
    pub fn new(data: Array2<f64>) -> Result<RawScan, ScanReadError> {
        Self::validate(data, "<memory>")
    }

    fn validate(data: Array2<f64>, file: &str) -> Result<RawScan, ScanReadError> {
        let (num_rows, num_cols) = data.dim();
        if num_cols != NUM_SCAN_COLUMNS {
            return Err(ScanReadError::ColumnCount {
                file: file.to_string(),
                line: 1,
                expected: NUM_SCAN_COLUMNS,
                actual: num_cols,
            });
        }
        if num_rows < 2 {
            return Err(ScanReadError::TooFewRows {
                file: file.to_string(),
                expected: 3,
                actual: num_rows + 1,
            });
        }
        let freqs = data.column(FREQ_COLUMN);
        if let Some(channel) = freqs
            .windows(2)
            .into_iter()
            .position(|w| !(w[0].is_finite() && w[1].is_finite() && w[1] > w[0]))
        {
            return Err(ScanReadError::NonMonotonicFreqs {
                file: file.to_string(),
                channel: channel + 1,
            });
        }
        Ok(RawScan { data })
    }

    pub fn num_channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// The relative frequency axis \[MHz\].
    pub fn freqs(&self) -> ArrayView1<f64> {
        self.data.column(FREQ_COLUMN)
    }

    /// The amplitudes of a polarisation.
    pub fn amplitudes(&self, pol: Polarisation) -> ArrayView1<f64> {
        self.data.column(pol.scan_column())
    }

    /// The whole table.
    pub fn data(&self) -> ArrayView2<f64> {
        self.data.view()
    }
}

/// Read a raw scan file. The first row is discarded.
pub fn read_scan(file: &Path) -> Result<RawScan, ScanReadError> {
    let file_str = file.display().to_string();
    debug!("Reading scan {file_str}");
    let contents = std::fs::read_to_string(file).map_err(|err| ScanReadError::Open {
        file: file_str.clone(),
        err,
    })?;

    let mut values = Vec::new();
    let mut num_rows = 0;
    for (i_line, line) in contents.lines().enumerate() {
        let line_num = i_line + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut num_cols = 0;
        for value in line.split_whitespace() {
            let v: f64 = value.parse().map_err(|_| ScanReadError::ParseValue {
                file: file_str.clone(),
                line: line_num,
                value: value.to_string(),
            })?;
            // The header-artifact row is discarded.
            if num_rows > 0 {
                values.push(v);
            }
            num_cols += 1;
        }
        if num_cols != NUM_SCAN_COLUMNS {
            return Err(ScanReadError::ColumnCount {
                file: file_str,
                line: line_num,
                expected: NUM_SCAN_COLUMNS,
                actual: num_cols,
            });
        }
        num_rows += 1;
    }
    trace!("{file_str}: {num_rows} rows (including the header row)");

    if num_rows < 3 {
        return Err(ScanReadError::TooFewRows {
            file: file_str,
            expected: 3,
            actual: num_rows,
        });
    }
    let data = Array2::from_shape_vec((num_rows - 1, NUM_SCAN_COLUMNS), values)?;
    RawScan::validate(data, &file_str)
}

/// Read the signal and reference scans of a frequency-switched pair. The scans
/// must have identical frequency axes.
pub fn read_scan_pair(signal: &Path, reference: &Path) -> Result<(RawScan, RawScan), ScanReadError> {
    let signal = read_scan(signal)?;
    let reference = read_scan(reference)?;
    check_pair_alignment(&signal, &reference)?;
    Ok((signal, reference))
}

/// Ensure two scans can be combined channel by channel.
pub fn check_pair_alignment(signal: &RawScan, reference: &RawScan) -> Result<(), ScanReadError> {
    if signal.num_channels() != reference.num_channels() {
        return Err(ScanReadError::DimensionMismatch {
            signal: signal.num_channels(),
            reference: reference.num_channels(),
        });
    }
    if let Some(channel) = signal
        .freqs()
        .iter()
        .zip(reference.freqs())
        .position(|(s, r)| (s - r).abs() > 1e-9 * s.abs().max(1.0))
    {
        return Err(ScanReadError::FreqMismatch { channel });
    }
    Ok(())
}
