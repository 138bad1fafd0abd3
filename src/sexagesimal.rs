// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Code for handling sexagesimal coordinates.

Experiment logs list coordinates as three separate fields (e.g. RA `["22",
"56", "18.1"]` and Dec `["-05", "01", "49.5"]`), and the ephemeris program
wants them back as space-delimited fields.
 */

use std::fmt;

use thiserror::Error;

/// A sky position \[degrees\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaDec {
    /// Right ascension \[degrees\]
    pub ra: f64,
    /// Declination \[degrees\]
    pub dec: f64,
}

impl RaDec {
    /// Make a position from experiment-log fields; RA is "hours minutes
    /// seconds", Dec is "degrees minutes seconds".
    pub fn from_log_fields<S: AsRef<str>>(ra: &[S], dec: &[S]) -> Result<RaDec, SexagesimalError> {
        Ok(RaDec {
            ra: sexagesimal_fields_to_degrees(ra)? * 15.0,
            dec: sexagesimal_fields_to_degrees(dec)?,
        })
    }
}

/// A sky position as an experiment log lists it. The fields are kept verbatim
/// so that they reach the ephemeris program with all of their digits.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPosition {
    pub ra_fields: [String; 3],
    pub dec_fields: [String; 3],
    pub radec: RaDec,
}

impl LogPosition {
    pub fn new(
        ra_fields: [String; 3],
        dec_fields: [String; 3],
    ) -> Result<LogPosition, SexagesimalError> {
        let radec = RaDec::from_log_fields(&ra_fields, &dec_fields)?;
        Ok(LogPosition {
            ra_fields,
            dec_fields,
            radec,
        })
    }
}

impl fmt::Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RA {}, Dec {}",
            self.ra_fields.join(" "),
            self.dec_fields.join(" ")
        )
    }
}

/// Convert three sexagesimal fields (e.g. `["-05", "01", "49.5"]`) to a float.
/// The sign is taken from the first field's text, so "-00" is handled
/// correctly.
pub fn sexagesimal_fields_to_degrees<S: AsRef<str>>(fields: &[S]) -> Result<f64, SexagesimalError> {
    if fields.len() != 3 {
        return Err(SexagesimalError::WrongFieldCount(
            fields
                .iter()
                .map(|f| f.as_ref())
                .collect::<Vec<_>>()
                .join(" "),
        ));
    }
    let first = fields[0].as_ref().trim();
    let negative = first.starts_with('-');
    let d: f64 = first.parse()?;
    let m: f64 = fields[1].as_ref().trim().parse()?;
    let s: f64 = fields[2].as_ref().trim().parse()?;
    let num = d.abs() + m / 60.0 + s / 3600.0;
    Ok(if negative { -num } else { num })
}

#[derive(Error, Debug)]
pub enum SexagesimalError {
    /// Three numbers (fields) are expected; this error is used when the number
    /// of fields is not three.
    #[error("Did not get three sexagesimal fields: {0}")]
    WrongFieldCount(String),

    #[error("{0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}
