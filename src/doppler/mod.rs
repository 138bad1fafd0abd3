// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Doppler correction of calibrated spectra.

A sky frequency is converted into a source velocity relative to a molecular
transition's rest frequency, after adding the receiver's own motion (the
velocity correction). Velocity corrections come from a [`VelocityCorrector`];
usually that's the external `dopset` ephemeris program.
 */

mod dopset;
mod error;

pub use dopset::{parse_dopset_output, DopsetProgram, DEFAULT_DOPSET_OUTPUT};
pub use error::EphemerisError;

use hifitime::Epoch;
use vec1::Vec1;

use crate::{constants::VEL_C, math::nearest_index, sexagesimal::LogPosition};

/// Source velocities \[km/s\] of the given sky frequencies \[Hz\]:
/// `v = (-(f/f0 - 1) * c + v_receiver) / 1000`, with `v_receiver` converted
/// to m/s.
pub fn velocity_axis(freq_hz: &[f64], v_receiver_km_s: f64, rest_hz: f64) -> Vec<f64> {
    freq_hz
        .iter()
        .map(|f| (-(f / rest_hz - 1.0) * VEL_C + v_receiver_km_s * 1000.0) / 1000.0)
        .collect()
}

/// A known molecular transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub label: String,
    /// \[Hz\]
    pub frequency: f64,
}

/// An ordered, non-empty table of rest frequencies.
#[derive(Debug, Clone)]
pub struct RestFrequencyTable {
    transitions: Vec1<Transition>,
}

impl RestFrequencyTable {
    pub fn new(entries: Vec1<(String, f64)>) -> RestFrequencyTable {
        RestFrequencyTable {
            transitions: entries.mapped(|(label, frequency)| Transition { label, frequency }),
        }
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// The index of the transition nearest to a sky frequency \[Hz\]. Earlier
    /// entries win ties.
    pub fn nearest_index(&self, sky_freq_hz: f64) -> usize {
        let freqs: Vec<f64> = self.transitions.iter().map(|t| t.frequency).collect();
        nearest_index(&freqs, sky_freq_hz).unwrap_or(0)
    }

    /// The transition nearest to a sky frequency \[Hz\].
    pub fn nearest(&self, sky_freq_hz: f64) -> &Transition {
        &self.transitions[self.nearest_index(sky_freq_hz)]
    }

    pub fn get(&self, index: usize) -> Option<&Transition> {
        self.transitions.get(index)
    }
}

/// The velocity of the receiver for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCorrection {
    /// The total receiver velocity to correct for \[km/s\].
    pub velocity_total: f64,
    /// \[MHz\]
    pub lsr_shift: Option<f64>,
    /// \[km/s\]
    pub observer_velocity: Option<f64>,
    pub mjd: Option<f64>,
    /// \[MHz\]
    pub at_freq: Option<f64>,
    /// \[MHz\]
    pub freq_shift: Option<f64>,
}

/// Something that can say how fast the receiver was moving relative to the
/// standard of rest when looking at a position at a time.
pub trait VelocityCorrector {
    fn velocity_correction(
        &self,
        epoch: Epoch,
        position: &LogPosition,
    ) -> Result<VelocityCorrection, EphemerisError>;
}

/// A constant velocity correction \[km/s\]. Zero means no correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedVelocity(pub f64);

impl VelocityCorrector for FixedVelocity {
    fn velocity_correction(
        &self,
        _epoch: Epoch,
        _position: &LogPosition,
    ) -> Result<VelocityCorrection, EphemerisError> {
        Ok(VelocityCorrection {
            velocity_total: self.0,
            ..Default::default()
        })
    }
}
