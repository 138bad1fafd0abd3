// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Calibration of frequency-switched maser spectra from single-dish radio
telescopes.

Pairs of signal/reference scans are cleaned of outliers, calibrated into flux
densities, given a signal-to-noise ratio, Doppler corrected and averaged into
a single spectrum per session.
 */

pub mod calibration;
pub mod cleaning;
mod cli;
pub mod config;
pub mod constants;
pub mod doppler;
pub mod io;
pub(crate) mod math;
pub mod metadata;
pub mod polarisation;
pub mod result;
pub mod session;
pub mod sexagesimal;
pub mod snr;

// Re-exports.
pub use cli::{Fscal, FscalError};
pub use config::PipelineConfig;
pub use metadata::ExperimentLog;
pub use polarisation::Polarisation;
pub use result::SessionResult;
pub use session::{Session, SessionError};

use crossbeam_utils::atomic::AtomicCell;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
