// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Processing a session of frequency-switched scan pairs.

A [`Session`] owns the pairs of one source and iteration. Each pair is
processed (loaded, cleaned, calibrated and given an SNR) independently, in
whatever order the caller likes; results are accumulated in the order they
were processed. Once every pair has been processed, the session is finalised:
each pair is Doppler corrected, a single species is chosen for the session,
and the pairs are averaged into a [`SessionResult`].
 */

mod error;
#[cfg(test)]
mod tests;

pub use error::SessionError;

use std::path::{Path, PathBuf};

use hifitime::Epoch;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};

use crate::{
    calibration::{calibrate_pair, CalibratedSpectrum, PairTsys},
    cleaning::{clean, CleaningParams},
    config::SiteConstants,
    doppler::{velocity_axis, RestFrequencyTable, VelocityCorrection, VelocityCorrector},
    io::{get_sorted_files_in_dir, read::read_scan_pair},
    math::argmax,
    metadata::{resolve_tsys, ExperimentLog, TsysResolver},
    polarisation::Polarisation,
    result::{ResultKey, SessionResult},
    sexagesimal::LogPosition,
    snr::snr,
    PROGRESS_BARS,
};

/// The files of a signal/reference scan pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPairFiles {
    pub signal: PathBuf,
    pub reference: PathBuf,
    /// The scan numbers, as used by the experiment log.
    pub signal_scan: String,
    pub reference_scan: String,
}

/// The directory holding the scans of a source's iteration.
pub fn session_dir(data_dir: &Path, source: &str, iteration: &str) -> PathBuf {
    data_dir.join(source).join(iteration)
}

/// Get a scan number from a scan file name: the last `_`-separated token of
/// the stem, without its first two characters and leading zeros, e.g.
/// `cepa_001_no0023.dat` is scan `23`.
pub fn scan_number_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let token = stem.rsplit('_').next()?;
    let number = token.get(2..)?.trim_start_matches('0');
    if number.is_empty() {
        None
    } else {
        Some(number.to_string())
    }
}

/// List the scan files of a directory and pair them up in name order. A
/// trailing file without a partner is ignored.
pub fn discover_scan_pairs(dir: &Path) -> Result<Vec<ScanPairFiles>, SessionError> {
    let files = get_sorted_files_in_dir(dir)?;
    let chunks = files.chunks_exact(2);
    if let [leftover] = chunks.remainder() {
        warn!(
            "{} has an odd number of scan files; ignoring {}",
            dir.display(),
            leftover.display()
        );
    }

    let scan_number = |p: &Path| {
        scan_number_from_path(p).ok_or_else(|| SessionError::ScanNumber(p.display().to_string()))
    };
    let pairs = chunks
        .map(|pair| {
            Ok(ScanPairFiles {
                signal_scan: scan_number(&pair[0])?,
                reference_scan: scan_number(&pair[1])?,
                signal: pair[0].clone(),
                reference: pair[1].clone(),
            })
        })
        .collect::<Result<Vec<_>, SessionError>>()?;
    debug!("Found {} scan pairs in {}", pairs.len(), dir.display());
    Ok(pairs)
}

/// Everything needed to process the pairs of a session, other than the pairs
/// themselves.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub source: String,
    pub iteration: String,
    pub cleaning: CleaningParams,
    pub site: SiteConstants,
    /// SNR exclusion windows on the trimmed relative frequency axis \[MHz\].
    pub cuts: Vec<[f64; 2]>,
    pub rest_frequencies: RestFrequencyTable,
    /// The sky frequency of relative frequency 0 \[MHz\].
    pub frequency_start_mhz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    Pending,
    Processed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Collecting,
    Finalized,
}

/// The signal-to-noise ratios of a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSnr {
    pub u1: f64,
    pub u9: f64,
    /// Of the mean of both polarisations.
    pub average: f64,
}

/// A pair after calibration.
#[derive(Debug, Clone)]
pub struct ProcessedPair {
    pub index: usize,
    pub signal_scan: String,
    pub reference_scan: String,
    /// The start of the signal scan.
    pub epoch: Epoch,
    /// The signal scan's position.
    pub position: LogPosition,
    /// The mean elevation of both scans \[degrees\].
    pub elevation: f64,
    pub tsys: PairTsys,
    pub num_bad_points: usize,
    pub spectrum: CalibratedSpectrum,
}

/// A pair with a velocity axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DopplerCorrectedSpectrum {
    pub pair_index: usize,
    pub correction: VelocityCorrection,
    /// \[km/s\]
    pub velocity: Vec<f64>,
    /// \[Jy\]
    pub u1: Vec<f64>,
    /// \[Jy\]
    pub u9: Vec<f64>,
}

/// The per-pair products of a session, in processing order.
#[derive(Debug, Clone, Default)]
pub struct SessionAccumulator {
    pairs: Vec<ProcessedPair>,
    snr_u1: Vec<f64>,
    snr_u9: Vec<f64>,
    snr_average: Vec<f64>,
    corrected: Vec<DopplerCorrectedSpectrum>,
}

impl SessionAccumulator {
    fn push(&mut self, pair: ProcessedPair, snr: PairSnr) {
        self.pairs.push(pair);
        self.snr_u1.push(snr.u1);
        self.snr_u9.push(snr.u9);
        self.snr_average.push(snr.average);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[ProcessedPair] {
        &self.pairs
    }

    pub fn snr(&self, i: usize) -> Option<PairSnr> {
        Some(PairSnr {
            u1: *self.snr_u1.get(i)?,
            u9: *self.snr_u9.get(i)?,
            average: *self.snr_average.get(i)?,
        })
    }

    /// Filled in at finalisation, in the same order as [`Self::pairs`].
    pub fn corrected(&self) -> &[DopplerCorrectedSpectrum] {
        &self.corrected
    }
}

pub struct Session {
    params: SessionParams,
    log: ExperimentLog,
    pairs: Vec<ScanPairFiles>,
    pair_states: Vec<PairState>,
    state: SessionState,
    accumulator: SessionAccumulator,
    tsys_resolver: Box<dyn TsysResolver>,
    velocity_corrector: Box<dyn VelocityCorrector>,
}

impl Session {
    pub fn new(
        params: SessionParams,
        log: ExperimentLog,
        pairs: Vec<ScanPairFiles>,
        tsys_resolver: Box<dyn TsysResolver>,
        velocity_corrector: Box<dyn VelocityCorrector>,
    ) -> Result<Session, SessionError> {
        params.cleaning.validate()?;
        Ok(Session {
            params,
            log,
            pair_states: vec![PairState::Pending; pairs.len()],
            pairs,
            state: SessionState::Collecting,
            accumulator: SessionAccumulator::default(),
            tsys_resolver,
            velocity_corrector,
        })
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[ScanPairFiles] {
        &self.pairs
    }

    pub fn pair_state(&self, index: usize) -> Option<PairState> {
        self.pair_states.get(index).copied()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn accumulator(&self) -> &SessionAccumulator {
        &self.accumulator
    }

    pub fn log(&self) -> &ExperimentLog {
        &self.log
    }

    /// The key the session's result is stored under.
    pub fn result_key(&self) -> Result<ResultKey, SessionError> {
        Ok(ResultKey {
            source: self.params.source.clone(),
            date: self.log.header.dates.clone(),
            first_scan_start_time: self.log.first_scan_start_time()?.to_string(),
            location: self.log.header.location.clone(),
            iteration: self.params.iteration.clone(),
        })
    }

    /// Load, clean, calibrate and measure the SNR of a pair, then append it
    /// to the accumulator.
    pub fn process_pair(&mut self, index: usize) -> Result<&ProcessedPair, SessionError> {
        if self.state == SessionState::Finalized {
            return Err(SessionError::Finalized);
        }
        match self.pair_states.get(index) {
            None => {
                return Err(SessionError::PairIndexOutOfRange {
                    index,
                    num_pairs: self.pairs.len(),
                })
            }
            Some(PairState::Processed) => return Err(SessionError::PairAlreadyProcessed(index)),
            Some(PairState::Pending) => (),
        }

        let files = &self.pairs[index];
        debug!(
            "Processing pair {index}: {} and {}",
            files.signal.display(),
            files.reference.display()
        );
        let (signal, reference) = read_scan_pair(&files.signal, &files.reference)?;
        let signal_meta = self.log.scan(&files.signal_scan)?;
        let reference_meta = self.log.scan(&files.reference_scan)?;

        let resolver = self.tsys_resolver.as_ref();
        let tsys = PairTsys {
            u1: resolve_tsys(&files.reference_scan, reference_meta, Polarisation::U1, resolver)?,
            u9: resolve_tsys(&files.reference_scan, reference_meta, Polarisation::U9, resolver)?,
        };
        let elevation = (signal_meta.elevation + reference_meta.elevation) / 2.0;
        let epoch = signal_meta.start_epoch(&files.signal_scan)?;
        let position = signal_meta.position(&files.signal_scan)?;

        let cleaned = clean(&signal, &reference, &self.params.cleaning)?;
        let spectrum = calibrate_pair(&cleaned, &tsys, elevation, &self.params.site)?;
        let x = &spectrum.x_trimmed;
        let cuts = &self.params.cuts;
        let pair_snr = PairSnr {
            u1: snr(x, &spectrum.u1.trimmed, cuts),
            u9: snr(x, &spectrum.u9.trimmed, cuts),
            average: snr(x, &spectrum.trimmed_average(), cuts),
        };
        info!(
            "Pair {index} (scans {} and {}): SNR u1 {:.2}, u9 {:.2}, average {:.2}",
            files.signal_scan, files.reference_scan, pair_snr.u1, pair_snr.u9, pair_snr.average
        );

        let pair = ProcessedPair {
            index,
            signal_scan: files.signal_scan.clone(),
            reference_scan: files.reference_scan.clone(),
            epoch,
            position,
            elevation,
            tsys,
            num_bad_points: cleaned.num_bad_points(),
            spectrum,
        };
        self.accumulator.push(pair, pair_snr);
        self.pair_states[index] = PairState::Processed;
        Ok(&self.accumulator.pairs[self.accumulator.len() - 1])
    }

    /// Process every pending pair in index order, stopping at the first
    /// error.
    pub fn process_remaining(&mut self) -> Result<(), SessionError> {
        let pending: Vec<usize> = self
            .pair_states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == PairState::Pending)
            .map(|(i, _)| i)
            .collect();

        let pb = ProgressBar::with_draw_target(
            Some(pending.len() as _),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} pairs ({elapsed_precise}<{eta_precise})")
                .expect("progress bar template is valid")
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message("Calibrating pairs");

        for index in pending {
            self.process_pair(index)?;
            pb.inc(1);
        }
        pb.finish_with_message("Pairs calibrated");
        Ok(())
    }

    /// Doppler correct every processed pair, decide the session's species and
    /// average the pairs. The session can't be finalised twice.
    pub fn finalize(&mut self) -> Result<SessionResult, SessionError> {
        if self.state == SessionState::Finalized {
            return Err(SessionError::AlreadyFinalized);
        }
        if self.pairs.is_empty() || self.accumulator.is_empty() {
            return Err(SessionError::NoPairs);
        }
        let pending: Vec<usize> = self
            .pair_states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == PairState::Pending)
            .map(|(i, _)| i)
            .collect();
        if !pending.is_empty() {
            return Err(SessionError::PairsPending(pending));
        }

        let fstart = self.params.frequency_start_mhz;
        let table = &self.params.rest_frequencies;
        let sky_freqs_hz = |x: &[f64]| -> Vec<f64> { x.iter().map(|x| (x + fstart) * 1e6).collect() };

        // Every polarisation of every pair votes for the transition nearest
        // its peak.
        let mut votes: IndexMap<usize, (usize, f64)> = IndexMap::new();
        let mut corrections = Vec::with_capacity(self.accumulator.len());
        for pair in &self.accumulator.pairs {
            let correction = self
                .velocity_corrector
                .velocity_correction(pair.epoch, &pair.position)?;
            corrections.push(correction);

            for pol in [Polarisation::U1, Polarisation::U9] {
                let flux = &pair.spectrum.pol(pol).trimmed;
                let Some(peak) = argmax(flux) else {
                    continue;
                };
                let sky = (pair.spectrum.x_trimmed[peak] + fstart) * 1e6;
                let transition = table.nearest_index(sky);
                debug!(
                    "Pair {} {pol}: peak at {sky} Hz is nearest {}",
                    pair.index,
                    table.nearest(sky).label
                );
                let entry = votes.entry(transition).or_insert((0, f64::NEG_INFINITY));
                entry.0 += 1;
                entry.1 = entry.1.max(flux[peak]);
            }
        }
        let species_index = choose_species(&votes);
        let transition = table
            .get(species_index)
            .ok_or(SessionError::NoPairs)?
            .clone();
        info!(
            "Species: {} ({} Hz)",
            transition.label, transition.frequency
        );

        let expected = self.accumulator.pairs[0].spectrum.x_trimmed.len();
        let mut corrected = Vec::with_capacity(self.accumulator.len());
        let mut velocity_sum = vec![0.0; expected];
        let mut u1_sum = vec![0.0; expected];
        let mut u9_sum = vec![0.0; expected];
        for (pair, correction) in self.accumulator.pairs.iter().zip(corrections) {
            let spectrum = &pair.spectrum;
            let actual = spectrum.x_trimmed.len();
            if actual != expected {
                return Err(SessionError::DimensionMismatch {
                    pair: pair.index,
                    expected,
                    actual,
                });
            }

            let velocity = velocity_axis(
                &sky_freqs_hz(&spectrum.x_trimmed),
                correction.velocity_total,
                transition.frequency,
            );
            for (sum, v) in velocity_sum.iter_mut().zip(&velocity) {
                *sum += v;
            }
            for (sum, v) in u1_sum.iter_mut().zip(&spectrum.u1.trimmed) {
                *sum += v;
            }
            for (sum, v) in u9_sum.iter_mut().zip(&spectrum.u9.trimmed) {
                *sum += v;
            }
            corrected.push(DopplerCorrectedSpectrum {
                pair_index: pair.index,
                correction,
                velocity,
                u1: spectrum.u1.trimmed.clone(),
                u9: spectrum.u9.trimmed.clone(),
            });
        }

        let n = corrected.len() as f64;
        let average = |sum: Vec<f64>| -> Vec<f64> { sum.into_iter().map(|s| s / n).collect() };
        let result = SessionResult {
            species: transition.label,
            rest_frequency: transition.frequency,
            velocity: average(velocity_sum),
            u1: average(u1_sum),
            u9: average(u9_sum),
        };

        self.accumulator.corrected = corrected;
        self.state = SessionState::Finalized;
        info!("Averaged {} pairs", self.accumulator.len());
        Ok(result)
    }
}

/// Pick the transition with the most votes. Ties go to the transition with
/// the strongest peak, then to the earlier table entry.
fn choose_species(votes: &IndexMap<usize, (usize, f64)>) -> usize {
    let mut best: Option<(usize, usize, f64)> = None;
    for (&index, &(count, peak)) in votes {
        let better = match best {
            None => true,
            Some((best_index, best_count, best_peak)) => {
                count > best_count
                    || (count == best_count
                        && (peak > best_peak || (peak == best_peak && index < best_index)))
            }
        };
        if better {
            best = Some((index, count, peak));
        }
    }
    best.map(|(index, _, _)| index).unwrap_or(0)
}
