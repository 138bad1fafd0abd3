// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Outlier cleaning of raw scan amplitudes.
//!
//! Each column (scan phase x polarisation) is cleaned independently. Samples
//! with a modified z-score at or above a threshold are replaced by a centred
//! rolling mean, repeatedly. Points flagged on the first pass are then
//! reconciled against their cleaned values; a point that barely changed was a
//! false positive and gets its original value back, anything else stays
//! flagged as a bad point.

mod error;

pub use error::CleaningError;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::{
    constants::{
        DEFAULT_FILTER_PASSES, DEFAULT_OUTLIER_THRESHOLD, DEFAULT_SMOOTHING_WINDOW,
        MODIFIED_Z_SCORE_SCALE, RECONCILE_RATIO_MAX, RECONCILE_RATIO_MIN,
    },
    io::read::RawScan,
    math::{centred_rolling_mean, median, polyfit, polyval},
    polarisation::Polarisation,
};

/// Which half of a frequency-switched pair a scan is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum ScanPhase {
    #[strum(serialize = "signal")]
    Signal,

    #[strum(serialize = "reference")]
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningParams {
    /// The number of filtering passes. 0 disables cleaning.
    pub filter_passes: usize,

    /// The modified z-score at or above which a sample is an outlier.
    pub threshold: f64,

    /// The width of the rolling mean that replaces outliers \[channels\].
    pub smoothing_window: usize,
}

impl Default for CleaningParams {
    fn default() -> Self {
        CleaningParams {
            filter_passes: DEFAULT_FILTER_PASSES,
            threshold: DEFAULT_OUTLIER_THRESHOLD,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl CleaningParams {
    pub fn validate(&self) -> Result<(), CleaningError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(CleaningError::InvalidThreshold(self.threshold));
        }
        if self.smoothing_window == 0 {
            return Err(CleaningError::InvalidSmoothingWindow);
        }
        Ok(())
    }
}

/// A sample that was flagged as an outlier and kept flagged after
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadPoint {
    pub index: usize,
    /// The frequency of the sample \[MHz\].
    pub x: f64,
    /// The sample's original (raw) value.
    pub y: f64,
}

/// The amplitudes of one scan phase and polarisation after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedColumn {
    pub values: Vec<f64>,
    pub bad_points: Vec<BadPoint>,
}

/// A frequency-switched pair after cleaning. All vectors have the same length
/// as the raw scans.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSpectrum {
    /// The relative frequency axis \[MHz\].
    pub x: Vec<f64>,
    /// Signal scan, u1.
    pub y1_u1: CleanedColumn,
    /// Reference scan, u1.
    pub y2_u1: CleanedColumn,
    /// Signal scan, u9.
    pub y1_u9: CleanedColumn,
    /// Reference scan, u9.
    pub y2_u9: CleanedColumn,
}

impl CleanedSpectrum {
    pub fn column(&self, phase: ScanPhase, pol: Polarisation) -> &CleanedColumn {
        match (phase, pol) {
            (ScanPhase::Signal, Polarisation::U1) => &self.y1_u1,
            (ScanPhase::Reference, Polarisation::U1) => &self.y2_u1,
            (ScanPhase::Signal, Polarisation::U9) => &self.y1_u9,
            (ScanPhase::Reference, Polarisation::U9) => &self.y2_u9,
        }
    }

    pub fn column_mut(&mut self, phase: ScanPhase, pol: Polarisation) -> &mut CleanedColumn {
        match (phase, pol) {
            (ScanPhase::Signal, Polarisation::U1) => &mut self.y1_u1,
            (ScanPhase::Reference, Polarisation::U1) => &mut self.y2_u1,
            (ScanPhase::Signal, Polarisation::U9) => &mut self.y1_u9,
            (ScanPhase::Reference, Polarisation::U9) => &mut self.y2_u9,
        }
    }

    pub fn num_bad_points(&self) -> usize {
        [&self.y1_u1, &self.y2_u1, &self.y1_u9, &self.y2_u9]
            .iter()
            .map(|c| c.bad_points.len())
            .sum()
    }
}

/// Clean both polarisations of a signal/reference pair. The scans must
/// already be aligned (see [`crate::io::read::check_pair_alignment`]).
pub fn clean(
    signal: &RawScan,
    reference: &RawScan,
    params: &CleaningParams,
) -> Result<CleanedSpectrum, CleaningError> {
    params.validate()?;
    let x = signal.freqs().to_vec();
    let column = |scan: &RawScan, pol: Polarisation| -> Result<CleanedColumn, CleaningError> {
        let y = scan.amplitudes(pol).to_vec();
        clean_column(&x, y, params)
    };

    let cleaned = CleanedSpectrum {
        y1_u1: column(signal, Polarisation::U1)?,
        y2_u1: column(reference, Polarisation::U1)?,
        y1_u9: column(signal, Polarisation::U9)?,
        y2_u9: column(reference, Polarisation::U9)?,
        x,
    };
    debug!(
        "Cleaning with {} passes left {} bad points",
        params.filter_passes,
        cleaned.num_bad_points()
    );
    Ok(cleaned)
}

/// Clean a single column of amplitudes.
pub fn clean_column(
    x: &[f64],
    mut y: Vec<f64>,
    params: &CleaningParams,
) -> Result<CleanedColumn, CleaningError> {
    if x.len() != y.len() {
        return Err(CleaningError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if params.filter_passes == 0 {
        return Ok(CleanedColumn {
            values: y,
            bad_points: vec![],
        });
    }

    let mut snapshot = vec![];
    for pass in 0..params.filter_passes {
        let outliers = outlier_mask(&y, params.threshold);
        if pass == 0 {
            snapshot = outliers
                .iter()
                .enumerate()
                .filter(|(_, &o)| o)
                .map(|(index, _)| BadPoint {
                    index,
                    x: x[index],
                    y: y[index],
                })
                .collect();
        }

        let rolling = centred_rolling_mean(&y, params.smoothing_window);
        for (value, (&outlier, mean)) in y.iter_mut().zip(outliers.iter().zip(rolling)) {
            match mean {
                Some(m) if outlier && m != 0.0 => *value = m,
                _ => (),
            }
        }
    }

    let mut bad_points = Vec::with_capacity(snapshot.len());
    for point in snapshot {
        let ratio = point.y / y[point.index];
        if ratio > RECONCILE_RATIO_MAX || ratio < RECONCILE_RATIO_MIN {
            trace!(
                "Channel {} stays flagged ({} -> {})",
                point.index,
                point.y,
                y[point.index]
            );
            bad_points.push(point);
        } else {
            y[point.index] = point.y;
        }
    }

    Ok(CleanedColumn {
        values: y,
        bad_points,
    })
}

/// The modified z-score of each sample: `0.6745 * |x - median| / MAD`, where
/// MAD is the median absolute deviation. A zero deviation scores 0; a non-zero
/// deviation with a zero MAD scores infinity.
pub fn modified_z_scores(values: &[f64]) -> Vec<f64> {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    deviations
        .into_iter()
        .map(|d| {
            if d == 0.0 {
                0.0
            } else if mad == 0.0 {
                f64::INFINITY
            } else {
                MODIFIED_Z_SCORE_SCALE * d / mad
            }
        })
        .collect()
}

/// Which samples are outliers.
pub fn outlier_mask(values: &[f64], threshold: f64) -> Vec<bool> {
    modified_z_scores(values)
        .into_iter()
        .map(|z| z >= threshold)
        .collect()
}

/// Replace `y[index]` with a least-squares polynomial of degree `order`,
/// fitted to the channels within `half_window` of `index` (excluding `index`
/// itself) and evaluated at `x[index]`. Returns the new value.
pub fn replace_with_local_polyfit(
    x: &[f64],
    y: &mut [f64],
    index: usize,
    half_window: usize,
    order: usize,
) -> Result<f64, CleaningError> {
    if x.len() != y.len() {
        return Err(CleaningError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if index >= y.len() {
        return Err(CleaningError::IndexOutOfRange {
            index,
            num_channels: y.len(),
        });
    }

    let start = index.saturating_sub(half_window);
    let end = (index + half_window + 1).min(y.len());
    let (xs, ys): (Vec<f64>, Vec<f64>) = (start..end)
        .filter(|&i| i != index)
        .map(|i| (x[i], y[i]))
        .unzip();
    if xs.len() < order + 1 {
        return Err(CleaningError::TooFewNeighbours {
            index,
            half_window,
            order,
            needed: order + 1,
            available: xs.len(),
        });
    }

    let coeffs = polyfit(&xs, &ys, order).ok_or(CleaningError::SingularFit { index })?;
    let new = polyval(&coeffs, x[index]);
    debug!("Replacing channel {index}: {} -> {new}", y[index]);
    y[index] = new;
    Ok(new)
}
