// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.
//!
//! These mirror the behaviour of their numpy namesakes where one exists.


use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector, SVD};

/// Singular values below this are treated as zero in least-squares fits.
const SINGULAR_VALUE_EPS: f64 = 1e-12;

/// The median of the values. NaNs sort last. An empty slice has a NaN median.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Greater));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// The arithmetic mean. An empty slice has a NaN mean.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// The population standard deviation (i.e. numpy's default `ddof=0`).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// The index of the maximum value. The first occurrence wins, like numpy's
/// `argmax`. `None` for an empty slice.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => (),
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// The index of the value nearest to `target`. The first occurrence wins.
pub(crate) fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - target).abs();
        match best {
            Some((_, b)) if d >= b => (),
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Evaluate a polynomial. The coefficients are ordered from the highest power
/// to the constant term (like numpy's `polyval`).
pub(crate) fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Circularly shift the elements of a slice by `shift` places (positive
/// shifts move elements towards higher indices), like numpy's `roll`.
pub(crate) fn roll(values: &[f64], shift: isize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![];
    }
    let shift = shift.rem_euclid(n as isize) as usize;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&values[n - shift..]);
    out.extend_from_slice(&values[..n - shift]);
    out
}

/// A centred rolling mean. The window for element `i` covers
/// `i - window/2 .. i - window/2 + window`; elements without a complete window
/// (i.e. near the edges) have no value.
pub(crate) fn centred_rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 || window > n {
        return vec![None; n];
    }
    let half = window / 2;
    let mut out = vec![None; n];
    for (i, o) in out.iter_mut().enumerate() {
        if i < half || i - half + window > n {
            continue;
        }
        let start = i - half;
        *o = Some(mean(&values[start..start + window]));
    }
    out
}

/// Fit a polynomial of degree `order` to the points with least squares. The
/// returned coefficients are ordered from the highest power to the constant
/// term, suitable for [`polyval`]. `None` is returned if the system is
/// singular or under-determined.
pub(crate) fn polyfit(x: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
    let num_coeffs = order + 1;
    if x.len() != y.len() || x.len() < num_coeffs {
        return None;
    }

    // Centre and scale the abscissae to keep the design matrix
    // well-conditioned.
    let x_mean = mean(x);
    let x_scale = x
        .iter()
        .map(|v| (v - x_mean).abs())
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE);
    let t: Vec<f64> = x.iter().map(|v| (v - x_mean) / x_scale).collect();

    // Vandermonde design matrix, columns ordered by ascending power.
    let design = DMatrix::from_fn(t.len(), num_coeffs, |r, c| t[r].powi(c as i32));
    let svd = SVD::new(design, true, true);
    if svd.rank(SINGULAR_VALUE_EPS) < num_coeffs {
        return None;
    }
    let scaled = svd
        .solve(&DVector::from_column_slice(y), SINGULAR_VALUE_EPS)
        .ok()?;
    if scaled.iter().any(|v| !v.is_finite()) {
        return None;
    }

    // Undo the scaling: p(x) = sum_k a_k ((x - m) / s)^k. Expand with Horner's
    // scheme on polynomials in x, highest power first.
    let mut result = vec![0.0; 1];
    for &a in scaled.iter().rev() {
        // result = result * ((x - m) / s) + a
        let mut next = vec![0.0; result.len() + 1];
        for (i, &r) in result.iter().enumerate() {
            next[i] += r / x_scale;
            next[i + 1] -= r * x_mean / x_scale;
        }
        let last = next.len() - 1;
        next[last] += a;
        result = next;
    }
    // The leading coefficient is always zero from the initial seed.
    result.remove(0);
    Some(result)
}
