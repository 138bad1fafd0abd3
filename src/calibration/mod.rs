// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Frequency-switch calibration.

The signal and reference scans of a pair are observed with the local
oscillator switched between two frequencies, so the line appears in both, a
quarter of the band apart. Each phase is converted to an antenna temperature
against the other, the two are shifted back into alignment and averaged, and
the result is converted to a flux density with the antenna's gain curve.

Circular shifting wraps channels around the band edges, so the `n_shift + 1`
channels at each end are junk and get trimmed.
 */

mod error;

pub use error::CalibrationError;

use log::{debug, trace};

use crate::{
    cleaning::{CleanedSpectrum, ScanPhase},
    config::SiteConstants,
    constants::FREQ_SWITCH_FRACTION,
    math::{mean, polyval, roll},
    polarisation::Polarisation,
};

/// The system temperatures of a pair \[K\]. One value per polarisation is
/// used for both phases; it comes from the pair's reference scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTsys {
    pub u1: f64,
    pub u9: f64,
}

impl PairTsys {
    pub fn get(&self, pol: Polarisation) -> f64 {
        match pol {
            Polarisation::U1 => self.u1,
            Polarisation::U9 => self.u9,
        }
    }
}

/// One polarisation of a calibrated pair \[Jy\].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedPolarisation {
    /// The full-length flux density.
    pub full: Vec<f64>,
    /// The flux density without the wrapped-around edge channels.
    pub trimmed: Vec<f64>,
}

/// Both polarisations of a calibrated pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedSpectrum {
    /// The frequency-switch shift \[channels\].
    pub n_shift: usize,
    /// The trimmed relative frequency axis \[MHz\].
    pub x_trimmed: Vec<f64>,
    pub u1: CalibratedPolarisation,
    pub u9: CalibratedPolarisation,
}

impl CalibratedSpectrum {
    pub fn pol(&self, pol: Polarisation) -> &CalibratedPolarisation {
        match pol {
            Polarisation::U1 => &self.u1,
            Polarisation::U9 => &self.u9,
        }
    }

    /// The mean of the two trimmed polarisations.
    pub fn trimmed_average(&self) -> Vec<f64> {
        self.u1
            .trimmed
            .iter()
            .zip(self.u9.trimmed.iter())
            .map(|(a, b)| (a + b) / 2.0)
            .collect()
    }
}

/// The degrees-per-flux-unit factor at an elevation \[degrees\]: the mean of
/// the site's maximum DPFUs scaled by its gain curve.
pub fn dpfu(site: &SiteConstants, elevation: f64) -> Result<f64, CalibrationError> {
    let dpfu = mean(&site.dpfu_max) * polyval(&site.gain_elevation, elevation);
    if !dpfu.is_finite() || dpfu == 0.0 {
        return Err(CalibrationError::InvalidDpfu { dpfu, elevation });
    }
    Ok(dpfu)
}

/// The frequency-switch shift \[channels\]: a quarter of the highest relative
/// frequency, in units of the channel step.
pub fn n_shift(x: &[f64]) -> Result<usize, CalibrationError> {
    let n = x.len();
    if n < 2 {
        return Err(CalibrationError::TooFewChannels(n));
    }
    let step = (x[n - 1] - x[0]) / (n - 1) as f64;
    if !step.is_finite() || step <= 0.0 {
        return Err(CalibrationError::InvalidStep(step));
    }
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let shift = (max * FREQ_SWITCH_FRACTION / step).round();
    if shift < 0.0 {
        return Err(CalibrationError::NegativeShift(shift));
    }
    Ok(shift as usize)
}

/// Drop `n_shift + 1` values from each end.
pub fn trim<T: Copy>(values: &[T], n_shift: usize) -> Result<Vec<T>, CalibrationError> {
    let edge = n_shift + 1;
    if values.len() <= 2 * edge {
        return Err(CalibrationError::TrimTooLarge {
            n_shift,
            num_channels: values.len(),
        });
    }
    Ok(values[edge..values.len() - edge].to_vec())
}

/// Shift the signal-phase temperatures up and the reference-phase
/// temperatures down by `n_shift` channels and average them.
pub(crate) fn shift_and_average(ta_sig: &[f64], ta_ref: &[f64], n_shift: usize) -> Vec<f64> {
    let shift = n_shift as isize;
    let sig = roll(ta_sig, shift);
    let refr = roll(ta_ref, -shift);
    sig.into_iter()
        .zip(refr)
        .map(|(s, r)| (s + r) / 2.0)
        .collect()
}

/// Calibrate one polarisation of a pair into a full-length flux density
/// \[Jy\].
pub fn calibrate(
    x: &[f64],
    p_sig: &[f64],
    p_ref: &[f64],
    t_sys_signal: f64,
    t_sys_reference: f64,
    elevation: f64,
    site: &SiteConstants,
) -> Result<Vec<f64>, CalibrationError> {
    let n = x.len();
    for (what, values) in [("the signal", p_sig), ("the reference", p_ref)] {
        if values.len() != n {
            return Err(CalibrationError::LengthMismatch {
                what,
                expected: n,
                actual: values.len(),
            });
        }
    }
    for t in [t_sys_signal, t_sys_reference] {
        if !t.is_finite() || t <= 0.0 {
            return Err(CalibrationError::InvalidTsys(t));
        }
    }
    let n_shift = n_shift(x)?;
    let dpfu = dpfu(site, elevation)?;
    trace!("n_shift = {n_shift}, DPFU = {dpfu}");

    let mut ta_sig = Vec::with_capacity(n);
    let mut ta_ref = Vec::with_capacity(n);
    for (channel, (&s, &r)) in p_sig.iter().zip(p_ref).enumerate() {
        if r == 0.0 {
            return Err(CalibrationError::ZeroPower {
                what: "reference",
                channel,
            });
        }
        if s == 0.0 {
            return Err(CalibrationError::ZeroPower {
                what: "signal",
                channel,
            });
        }
        ta_sig.push(t_sys_signal * (s - r) / r);
        ta_ref.push(t_sys_reference * (r - s) / s);
    }

    Ok(shift_and_average(&ta_sig, &ta_ref, n_shift)
        .into_iter()
        .map(|ta| ta / dpfu / site.k)
        .collect())
}

/// Calibrate and trim both polarisations of a cleaned pair.
pub fn calibrate_pair(
    cleaned: &CleanedSpectrum,
    tsys: &PairTsys,
    elevation: f64,
    site: &SiteConstants,
) -> Result<CalibratedSpectrum, CalibrationError> {
    let n_shift = n_shift(&cleaned.x)?;
    let x_trimmed = trim(&cleaned.x, n_shift)?;

    let calibrate_pol = |pol: Polarisation| -> Result<CalibratedPolarisation, CalibrationError> {
        let full = calibrate(
            &cleaned.x,
            &cleaned.column(ScanPhase::Signal, pol).values,
            &cleaned.column(ScanPhase::Reference, pol).values,
            tsys.get(pol),
            tsys.get(pol),
            elevation,
            site,
        )?;
        let trimmed = trim(&full, n_shift)?;
        Ok(CalibratedPolarisation { full, trimmed })
    };

    let spectrum = CalibratedSpectrum {
        n_shift,
        u1: calibrate_pol(Polarisation::U1)?,
        u9: calibrate_pol(Polarisation::U9)?,
        x_trimmed,
    };
    debug!(
        "Calibrated {} channels (n_shift = {n_shift}, {} after trimming)",
        cleaned.x.len(),
        spectrum.x_trimmed.len()
    );
    Ok(spectrum)
}
