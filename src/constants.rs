// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. `fscal` should do all spectral
calculations in double precision.
 */

// Things that should never change.

/// Speed of light \[metres/second\]
pub const VEL_C: f64 = 299_792_458.0;

/// The consistency constant that scales the median absolute deviation to the
/// standard deviation of a normal distribution (the 0.75 quantile of the
/// standard normal).
pub const MODIFIED_Z_SCORE_SCALE: f64 = 0.6745;

/// A snapshotted bad point whose original value is within this ratio range of
/// its cleaned value is considered a false positive and restored.
pub const RECONCILE_RATIO_MIN: f64 = 0.90;
/// See [`RECONCILE_RATIO_MIN`].
pub const RECONCILE_RATIO_MAX: f64 = 1.10;

/// The frequency-switch offset is this fraction of the maximum value of the
/// (relative) frequency axis.
pub const FREQ_SWITCH_FRACTION: f64 = 0.25;

/// Number of columns in a raw scan file.
pub const NUM_SCAN_COLUMNS: usize = 9;
/// The column of a raw scan holding the relative frequency axis \[MHz\].
pub const FREQ_COLUMN: usize = 0;
/// The column of a raw scan holding the "u1" polarisation amplitudes.
pub const U1_COLUMN: usize = 1;
/// The column of a raw scan holding the "u9" polarisation amplitudes.
pub const U9_COLUMN: usize = 2;

// Defaults.

/// The default modified z-score above which a sample is considered an outlier.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 1.0;

/// The default number of outlier-filtering passes (0 disables cleaning).
pub const DEFAULT_FILTER_PASSES: usize = 0;

/// The default rolling-mean window used to replace outliers \[channels\].
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// The largest valid system temperature that may be given as a substitute for
/// an invalid one \[K\].
pub const MAX_SUBSTITUTE_TSYS: f64 = 300.0;
