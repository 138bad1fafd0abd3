// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scan metadata from an experiment log.
//!
//! The field system's log is prettified (elsewhere) into JSON: a `header`
//! entry describing the session, plus one entry per scan number. Numeric
//! fields may be given either as JSON numbers or as numeric strings.

mod error;

pub use error::MetadataError;

use std::{collections::BTreeMap, io::Write, path::Path};

use hifitime::Epoch;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};

use crate::{constants::MAX_SUBSTITUTE_TSYS, polarisation::Polarisation, sexagesimal::LogPosition};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("'{s}' isn't a number"))),
        }
    }

    fn into_string(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s,
        }
    }
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(d)?.into_f64()
}

fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(d)?
        .map(NumberOrString::into_f64)
        .transpose()
}

fn de_f64_pair<'de, D: Deserializer<'de>>(d: D) -> Result<[f64; 2], D::Error> {
    let [a, b] = <[NumberOrString; 2]>::deserialize(d)?;
    Ok([a.into_f64()?, b.into_f64()?])
}

fn de_string_triple<'de, D: Deserializer<'de>>(d: D) -> Result<[String; 3], D::Error> {
    let [a, b, c] = <[NumberOrString; 3]>::deserialize(d)?;
    Ok([a.into_string(), b.into_string(), c.into_string()])
}

/// Session-wide details from the log's `header` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LogHeader {
    /// The session date, e.g. "23 Mar 2021".
    pub dates: String,

    /// The station name, e.g. "IRBENE". Selects the site constants.
    pub location: String,

    /// The base-band converter frequency \[MHz\].
    #[serde(rename = "BBC", deserialize_with = "de_f64")]
    pub bbc: f64,

    #[serde(default)]
    pub source: Option<String>,
}

/// The log's record of a single scan.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanMetadata {
    /// System temperatures for u1 and u9 \[K\].
    #[serde(rename = "Systemtemperature", deserialize_with = "de_f64_pair")]
    pub system_temperatures: [f64; 2],

    /// \[degrees\]
    #[serde(deserialize_with = "de_f64")]
    pub elevation: f64,

    /// "HH:MM:SS"
    #[serde(rename = "startTime")]
    pub start_time: String,

    /// "DD Mon YYYY"
    pub dates: String,

    #[serde(rename = "Ra", deserialize_with = "de_string_triple")]
    pub ra: [String; 3],

    #[serde(rename = "Dec", deserialize_with = "de_string_triple")]
    pub dec: [String; 3],

    /// The frequency-switching frequency of this scan \[MHz\].
    #[serde(
        rename = "fs_frequencyfs",
        default,
        deserialize_with = "de_opt_f64"
    )]
    pub fs_frequency: Option<f64>,
}

impl ScanMetadata {
    pub fn tsys(&self, pol: Polarisation) -> f64 {
        self.system_temperatures[pol.tsys_index()]
    }

    /// The UTC start of this scan.
    pub fn start_epoch(&self, scan: &str) -> Result<Epoch, MetadataError> {
        parse_epoch(&self.dates, &self.start_time).ok_or_else(|| MetadataError::InvalidTime {
            scan: scan.to_string(),
            value: format!("{} {}", self.dates, self.start_time),
        })
    }

    pub fn position(&self, scan: &str) -> Result<LogPosition, MetadataError> {
        LogPosition::new(self.ra.clone(), self.dec.clone()).map_err(|err| {
            MetadataError::InvalidPosition {
                scan: scan.to_string(),
                err,
            }
        })
    }
}

/// Parse "DD Mon YYYY" and "HH:MM:SS\[.s\]" into a UTC epoch.
fn parse_epoch(date: &str, time: &str) -> Option<Epoch> {
    let mut date_parts = date.split_whitespace();
    let day: u8 = date_parts.next()?.parse().ok()?;
    let month = date_parts.next()?.to_lowercase();
    let month = MONTHS.iter().position(|m| month.starts_with(m))? as u8 + 1;
    let year: i32 = date_parts.next()?.parse().ok()?;
    if date_parts.next().is_some() {
        return None;
    }

    let mut time_parts = time.trim().split(':');
    let hour: u8 = time_parts.next()?.parse().ok()?;
    let minute: u8 = time_parts.next()?.parse().ok()?;
    let seconds: f64 = time_parts.next()?.parse().ok()?;
    if time_parts.next().is_some() || !(0.0..61.0).contains(&seconds) {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as u32;

    Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, whole as u8, nanos).ok()
}

/// The experiment log of a session: its header and the per-scan records, keyed
/// by scan number.
#[derive(Debug, Clone)]
pub struct ExperimentLog {
    pub header: LogHeader,
    pub scans: BTreeMap<String, ScanMetadata>,
}

impl ExperimentLog {
    pub fn from_file(file: &Path) -> Result<ExperimentLog, MetadataError> {
        debug!("Reading experiment log {}", file.display());
        let contents = std::fs::read_to_string(file).map_err(|err| MetadataError::Open {
            file: file.display().to_string(),
            err,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(s: &str) -> Result<ExperimentLog, MetadataError> {
        let mut map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)?;
        let header = map.remove("header").ok_or(MetadataError::MissingHeader)?;
        let header: LogHeader =
            serde_json::from_value(header).map_err(MetadataError::InvalidHeader)?;

        let mut scans = BTreeMap::new();
        for (scan, value) in map {
            let record: ScanMetadata = serde_json::from_value(value)
                .map_err(|err| MetadataError::InvalidScan {
                    scan: scan.clone(),
                    err,
                })?;
            scans.insert(scan, record);
        }
        if scans.is_empty() {
            return Err(MetadataError::NoScans);
        }
        debug!("Experiment log has {} scans", scans.len());

        Ok(ExperimentLog { header, scans })
    }

    pub fn scan(&self, scan: &str) -> Result<&ScanMetadata, MetadataError> {
        self.scans.get(scan).ok_or_else(|| MetadataError::MissingScan {
            scan: scan.to_string(),
        })
    }

    /// The scan numbers, ordered numerically (non-numeric keys sort last).
    fn ordered_scan_numbers(&self) -> Vec<&str> {
        let mut numbers: Vec<&str> = self.scans.keys().map(|s| s.as_str()).collect();
        numbers.sort_by_key(|s| (s.parse::<u64>().unwrap_or(u64::MAX), *s));
        numbers
    }

    /// The start time of the first (lowest-numbered) scan, as written in the
    /// log.
    pub fn first_scan_start_time(&self) -> Result<&str, MetadataError> {
        let first = self
            .ordered_scan_numbers()
            .into_iter()
            .next()
            .ok_or(MetadataError::NoScans)?;
        Ok(&self.scans[first].start_time)
    }

    /// The sky frequency of relative frequency 0 \[MHz\]: the mean of the two
    /// highest distinct frequency-switching frequencies, plus the BBC
    /// frequency.
    pub fn frequency_start_mhz(&self) -> Result<f64, MetadataError> {
        let mut freqs: Vec<f64> = self
            .scans
            .values()
            .filter_map(|s| s.fs_frequency)
            .filter(|f| f.is_finite())
            .collect();
        freqs.sort_unstable_by(|a, b| a.total_cmp(b));
        freqs.dedup();
        match freqs.as_slice() {
            [.., a, b] => Ok((a + b) / 2.0 + self.header.bbc),
            _ => Err(MetadataError::TooFewFrequencies(freqs.len())),
        }
    }
}

/// A strategy for replacing a scan's invalid (non-positive or non-finite)
/// system temperature.
pub trait TsysResolver {
    /// Given an invalid value, return a substitute or an error.
    fn resolve(&self, scan: &str, pol: Polarisation, invalid: f64) -> Result<f64, MetadataError>;
}

/// Fail on any invalid system temperature.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectInvalidTsys;

impl TsysResolver for RejectInvalidTsys {
    fn resolve(&self, scan: &str, pol: Polarisation, invalid: f64) -> Result<f64, MetadataError> {
        Err(MetadataError::InvalidTsys {
            scan: scan.to_string(),
            pol,
            value: invalid,
        })
    }
}

/// Substitute a fixed system temperature \[K\].
#[derive(Debug, Clone, Copy)]
pub struct FixedTsys(pub f64);

impl TsysResolver for FixedTsys {
    fn resolve(&self, _scan: &str, _pol: Polarisation, _invalid: f64) -> Result<f64, MetadataError> {
        Ok(self.0)
    }
}

/// Ask the user on the terminal for a substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTsys;

impl TsysResolver for PromptTsys {
    fn resolve(&self, scan: &str, pol: Polarisation, invalid: f64) -> Result<f64, MetadataError> {
        let term = console::Term::stderr();
        loop {
            write!(
                &term,
                "Scan {scan} has an invalid {pol} system temperature ({invalid} K). Enter a substitute (0, {MAX_SUBSTITUTE_TSYS}] K: "
            )?;
            let line = term.read_line()?;
            match line.trim().parse::<f64>() {
                Ok(v) if is_valid_substitute_tsys(v) => return Ok(v),
                _ => writeln!(&term, "'{}' isn't a valid system temperature", line.trim())?,
            }
        }
    }
}

pub(crate) fn is_valid_tsys(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_valid_substitute_tsys(value: f64) -> bool {
    is_valid_tsys(value) && value <= MAX_SUBSTITUTE_TSYS
}

/// Get a usable system temperature for a scan and polarisation, consulting the
/// resolver when the logged value is invalid.
pub fn resolve_tsys(
    scan_number: &str,
    scan: &ScanMetadata,
    pol: Polarisation,
    resolver: &dyn TsysResolver,
) -> Result<f64, MetadataError> {
    let value = scan.tsys(pol);
    if is_valid_tsys(value) {
        return Ok(value);
    }

    warn!("Scan {scan_number} has an invalid {pol} system temperature ({value} K)");
    let substitute = resolver.resolve(scan_number, pol, value)?;
    if !is_valid_substitute_tsys(substitute) {
        return Err(MetadataError::InvalidSubstituteTsys {
            scan: scan_number.to_string(),
            pol,
            value: substitute,
            max: MAX_SUBSTITUTE_TSYS,
        });
    }
    debug!("Using {substitute} K for scan {scan_number} {pol}");
    Ok(substitute)
}
