// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read and write session results.
//!
//! A result is a little-endian binary file:
//!
//! | bytes        | contents                            |
//! |--------------|-------------------------------------|
//! | 8            | ASCII "FSCALRES"                    |
//! | 4            | u32 format version (1)              |
//! | 4            | u32 length of the species label     |
//! | (the length) | UTF-8 species label                 |
//! | 8            | f64 rest frequency \[Hz\]           |
//! | 4            | u32 channel count                   |
//! | 8 * count    | f64 velocities \[km/s\]             |
//! | 8 * count    | f64 u1 flux densities \[Jy\]        |
//! | 8 * count    | f64 u9 flux densities \[Jy\]        |

mod error;

pub use error::{ResultReadError, ResultWriteError};

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

const MAGIC: &str = "FSCALRES";
const FORMAT_VERSION: u32 = 1;

/// What a session result is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultKey {
    pub source: String,
    /// The session date, e.g. "23 Mar 2021".
    pub date: String,
    pub first_scan_start_time: String,
    pub location: String,
    pub iteration: String,
}

impl ResultKey {
    /// `<source>_<date>_<first scan start time>_<location>_<iteration>.dat`,
    /// with spaces in the date turned into underscores, and any other spaces
    /// and colons removed.
    pub fn file_name(&self) -> String {
        let name = format!(
            "{}_{}_{}_{}_{}.dat",
            self.source,
            self.date.split_whitespace().collect::<Vec<_>>().join("_"),
            self.first_scan_start_time,
            self.location,
            self.iteration
        );
        name.chars().filter(|c| *c != ' ' && *c != ':').collect()
    }
}

/// The averaged, Doppler-corrected spectrum of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub species: String,
    /// \[Hz\]
    pub rest_frequency: f64,
    /// \[km/s\]
    pub velocity: Vec<f64>,
    /// \[Jy\]
    pub u1: Vec<f64>,
    /// \[Jy\]
    pub u9: Vec<f64>,
}

impl SessionResult {
    pub fn num_channels(&self) -> usize {
        self.velocity.len()
    }

    /// Write the result into `dir` under its key's file name, replacing any
    /// previous result. Returns the path written.
    pub fn persist(&self, dir: &Path, key: &ResultKey) -> Result<PathBuf, ResultWriteError> {
        let path = dir.join(key.file_name());
        self.write(&path)?;
        info!("Wrote result to {}", path.display());
        Ok(path)
    }

    pub fn write(&self, file: &Path) -> Result<(), ResultWriteError> {
        let mut bin_file = BufWriter::new(File::create(file)?);
        self.write_to(&mut bin_file)?;
        bin_file.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> Result<(), ResultWriteError> {
        let n = self.velocity.len();
        if self.u1.len() != n || self.u9.len() != n {
            return Err(ResultWriteError::BadShape {
                velocity: n,
                u1: self.u1.len(),
                u9: self.u9.len(),
            });
        }

        w.write_all(MAGIC.as_bytes())?;
        w.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        w.write_u32::<LittleEndian>(self.species.len() as u32)?;
        w.write_all(self.species.as_bytes())?;
        w.write_f64::<LittleEndian>(self.rest_frequency)?;
        w.write_u32::<LittleEndian>(n as u32)?;
        for values in [&self.velocity, &self.u1, &self.u9] {
            for &v in values.iter() {
                w.write_f64::<LittleEndian>(v)?;
            }
        }
        Ok(())
    }

    pub fn read(file: &Path) -> Result<SessionResult, ResultReadError> {
        debug!("Reading result {}", file.display());
        let bin_file = BufReader::new(File::open(file)?);
        Self::read_from(bin_file, &file.display().to_string())
    }

    /// Read a result; `name` is only used in error messages.
    pub fn read_from<R: Read>(mut r: R, name: &str) -> Result<SessionResult, ResultReadError> {
        let mut magic = [0; 8];
        r.read_exact(&mut magic)?;
        if magic != MAGIC.as_bytes() {
            return Err(ResultReadError::Magic {
                file: name.to_string(),
                expected: MAGIC,
                got: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        let version = r.read_u32::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(ResultReadError::Version {
                file: name.to_string(),
                got: version,
                supported: FORMAT_VERSION,
            });
        }

        let species_len = r.read_u32::<LittleEndian>()?;
        let species = read_bytes(&mut r, u64::from(species_len), name, "species label")?;
        let species = String::from_utf8(species).map_err(|_| ResultReadError::Species {
            file: name.to_string(),
        })?;
        let rest_frequency = r.read_f64::<LittleEndian>()?;

        let n = r.read_u32::<LittleEndian>()?;
        let bytes = read_bytes(&mut r, 3 * 8 * u64::from(n), name, "spectra")?;
        let n = n as usize;
        let column = |i: usize| {
            let mut v = vec![0.0; n];
            LittleEndian::read_f64_into(&bytes[i * 8 * n..(i + 1) * 8 * n], &mut v);
            v
        };
        let velocity = column(0);
        let u1 = column(1);
        let u9 = column(2);

        Ok(SessionResult {
            species,
            rest_frequency,
            velocity,
            u1,
            u9,
        })
    }

    /// Write the result as whitespace-delimited text columns (velocity, u1,
    /// u9), after a commented header.
    pub fn write_text<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "# species: {}", self.species)?;
        writeln!(w, "# rest frequency: {} Hz", self.rest_frequency)?;
        writeln!(w, "# velocity [km/s]  u1 [Jy]  u9 [Jy]")?;
        for ((v, u1), u9) in self.velocity.iter().zip(&self.u1).zip(&self.u9) {
            writeln!(w, "{v:.6} {u1:.6} {u9:.6}")?;
        }
        Ok(())
    }
}

/// Read `len` bytes. The buffer only grows with what is actually read, so a
/// corrupt length can't trigger a huge allocation.
fn read_bytes<R: Read>(
    r: R,
    len: u64,
    name: &str,
    what: &'static str,
) -> Result<Vec<u8>, ResultReadError> {
    let mut bytes = vec![];
    r.take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(ResultReadError::Truncated {
            file: name.to_string(),
            what,
            expected: len,
            got: bytes.len() as u64,
        });
    }
    Ok(bytes)
}
