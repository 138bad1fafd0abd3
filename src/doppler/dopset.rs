// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Velocity corrections from the external `dopset` ephemeris program.
//!
//! The program is given the UTC date and time and the source position as
//! positional arguments (`YYYY M D HH MM SS RA_h RA_m RA_s DEC_d DEC_m
//! DEC_s`), and writes semicolon-delimited "key;value" lines into a file in
//! its working directory:
//!
//! ```text
//! Date;2021 3 23
//! Time;10 00 00
//! RA;22 56 18.1
//! DEC;62 01 49.5
//! Source;
//! LSRshift;-0.2461
//! MJD;59296.416667
//! Vobs;-12.21
//! AtFreq;6668.5192
//! FreqShift;0.2716
//! VelTotal;-12.2132
//! ```

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use hifitime::Epoch;
use log::{debug, trace};

use super::{EphemerisError, VelocityCorrection, VelocityCorrector};
use crate::sexagesimal::LogPosition;

/// The name of the file `dopset` writes its results to.
pub const DEFAULT_DOPSET_OUTPUT: &str = "lsrShift.dat";

#[derive(Debug, Clone)]
pub struct DopsetProgram {
    pub(super) program: PathBuf,
    pub(super) working_dir: PathBuf,
    output_file: PathBuf,
}

impl DopsetProgram {
    /// Run `program` in `working_dir`, where it leaves [`DEFAULT_DOPSET_OUTPUT`].
    /// Relative paths are taken from the current directory.
    pub fn new(program: PathBuf, working_dir: PathBuf) -> Result<DopsetProgram, EphemerisError> {
        let cwd = std::env::current_dir().map_err(EphemerisError::CurrentDir)?;
        Ok(Self::relative_to(&cwd, program, working_dir))
    }

    /// Like [`DopsetProgram::new`], with relative paths taken from `base`. A
    /// bare program name (no directory) is left for the `PATH` search.
    pub fn relative_to(base: &Path, program: PathBuf, working_dir: PathBuf) -> DopsetProgram {
        let program = if program.is_relative() && program.components().count() > 1 {
            base.join(program)
        } else {
            program
        };
        DopsetProgram {
            program,
            working_dir: base.join(working_dir),
            output_file: PathBuf::from(DEFAULT_DOPSET_OUTPUT),
        }
    }


    /// Use a different output file name (relative to the working directory).
    pub fn with_output_file(mut self, output_file: PathBuf) -> DopsetProgram {
        self.output_file = output_file;
        self
    }

    pub(super) fn output_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_file)
    }

    /// The program's positional arguments for an observation.
    pub fn arguments(epoch: Epoch, position: &LogPosition) -> Vec<String> {
        let (year, month, day, hour, minute, second, _) = epoch.to_gregorian_utc();
        let mut args = vec![
            year.to_string(),
            month.to_string(),
            day.to_string(),
            format!("{hour:02}"),
            format!("{minute:02}"),
            format!("{second:02}"),
        ];
        args.extend(position.ra_fields.iter().cloned());
        args.extend(position.dec_fields.iter().cloned());
        args
    }
}

impl VelocityCorrector for DopsetProgram {
    fn velocity_correction(
        &self,
        epoch: Epoch,
        position: &LogPosition,
    ) -> Result<VelocityCorrection, EphemerisError> {
        let program = self.program.display().to_string();
        let output = self.output_path();
        // A stale file from a previous run must never be mistaken for this
        // run's output.
        if output.exists() {
            std::fs::remove_file(&output).map_err(|err| EphemerisError::ReadOutput {
                file: output.display().to_string(),
                err,
            })?;
        }

        let args = Self::arguments(epoch, position);
        debug!("Running {program} {}", args.join(" "));
        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|err| EphemerisError::Spawn {
                program: program.clone(),
                err,
            })?;
        if !status.success() {
            return Err(EphemerisError::NonZeroExit {
                program,
                status: status.to_string(),
            });
        }

        read_dopset_output(&output)
    }
}

fn read_dopset_output(file: &Path) -> Result<VelocityCorrection, EphemerisError> {
    let contents = std::fs::read_to_string(file).map_err(|err| EphemerisError::ReadOutput {
        file: file.display().to_string(),
        err,
    })?;
    parse_dopset_output(&contents)
}

/// Parse the contents of a `dopset` output file. Only `VelTotal` is
/// mandatory.
pub fn parse_dopset_output(contents: &str) -> Result<VelocityCorrection, EphemerisError> {
    let mut velocity_total = None;
    let mut correction = VelocityCorrection::default();

    for line in contents.lines() {
        let mut split = line.splitn(3, ';');
        let (key, value) = match (split.next(), split.next()) {
            (Some(k), Some(v)) => (k.trim(), v.trim()),
            _ => continue,
        };
        let number = || {
            value
                .parse::<f64>()
                .map_err(|_| EphemerisError::ParseField {
                    key: key.to_string(),
                    value: value.to_string(),
                })
        };
        match key {
            "VelTotal" => velocity_total = Some(number()?),
            "LSRshift" => correction.lsr_shift = Some(number()?),
            "Vobs" => correction.observer_velocity = Some(number()?),
            "MJD" => correction.mjd = Some(number()?),
            "AtFreq" => correction.at_freq = Some(number()?),
            "FreqShift" => correction.freq_shift = Some(number()?),
            _ => trace!("dopset: {key} = {value}"),
        }
    }

    correction.velocity_total = velocity_total.ok_or(EphemerisError::MissingField("VelTotal"))?;
    debug!("Velocity correction: {correction:?}");
    Ok(correction)
}
