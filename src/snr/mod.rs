// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Signal-to-noise ratios of spectra.
//!
//! The noise is the population standard deviation of the samples outside the
//! exclusion windows ("cuts") that cover the known lines of a source.


use crate::math::{nearest_index, std_dev};

/// The signal-to-noise ratio `max(y) / (3 * std)` of a spectrum.
///
/// Each `[low, high]` window is snapped to the nearest samples of `x`, and
/// samples with indices inside any window (inclusive) don't contribute to the
/// noise. With no windows, all samples are noise.
///
/// If the noise is exactly zero, the result is `f64::INFINITY`. If no samples
/// are left for the noise (or `y` is empty), the result is `f64::NAN`.
pub fn snr(x: &[f64], y: &[f64], windows: &[[f64; 2]]) -> f64 {
    let ranges: Vec<(usize, usize)> = windows
        .iter()
        .filter_map(|&[low, high]| {
            let a = nearest_index(x, low)?;
            let b = nearest_index(x, high)?;
            Some((a.min(b), a.max(b)))
        })
        .collect();
    let noise: Vec<f64> = y
        .iter()
        .enumerate()
        .filter(|(i, _)| !ranges.iter().any(|&(a, b)| (a..=b).contains(i)))
        .map(|(_, &v)| v)
        .collect();
    if noise.is_empty() {
        return f64::NAN;
    }

    let std = std_dev(&noise);
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if std == 0.0 {
        return f64::INFINITY;
    }
    max / (3.0 * std)
}
