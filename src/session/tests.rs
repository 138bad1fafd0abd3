// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Write as _;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;
use vec1::vec1;

use super::*;
use crate::{
    doppler::FixedVelocity,
    metadata::{FixedTsys, MetadataError, RejectInvalidTsys},
};

const FSTART: f64 = 6668.0;

/// Write a scan file with `n` channels. The signal-ish amplitudes alternate
/// between `hi` and `lo`.
fn write_scan(dir: &Path, name: &str, n: usize, amplitude: impl Fn(usize) -> f64) {
    let mut s = String::from("9999 9999 9999 0 0 0 0 0 0\n");
    for i in 0..n {
        let a = amplitude(i);
        writeln!(s, "{} {a} {a} 0 0 0 0 0 0", i as f64 * 0.01).unwrap();
    }
    std::fs::write(dir.join(name), s).unwrap();
}

fn alternating(hi: f64, lo: f64) -> impl Fn(usize) -> f64 {
    move |i| if i % 2 == 0 { hi } else { lo }
}

fn log_json(tsys: f64) -> String {
    log_json_per_scan(|_| tsys)
}

/// An experiment log where scan `n` has a system temperature of `tsys(n)`.
fn log_json_per_scan(tsys: impl Fn(usize) -> f64) -> String {
    let mut scans = vec![];
    for scan in 1..=4 {
        let tsys = tsys(scan);
        scans.push(format!(
            r#""{scan}": {{"Systemtemperature": [{tsys}, {tsys}], "elevation": 45,
                "startTime": "10:0{scan}:00", "dates": "23 Mar 2021",
                "Ra": ["22", "56", "18.1"], "Dec": ["62", "01", "49.5"],
                "fs_frequencyfs": {}}}"#,
            6660 + 2 * (scan % 2)
        ));
    }
    format!(
        r#"{{"header": {{"dates": "23 Mar 2021", "location": "IRBENE", "BBC": 0}}, {}}}"#,
        scans.join(", ")
    )
}

/// A session directory with two pairs of 100 channels each.
fn make_session_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_scan(dir.path(), "cepa_001_no0001.dat", 100, alternating(12.0, 8.0));
    write_scan(dir.path(), "cepa_001_no0002.dat", 100, |_| 10.0);
    write_scan(dir.path(), "cepa_001_no0003.dat", 100, alternating(14.0, 6.0));
    write_scan(dir.path(), "cepa_001_no0004.dat", 100, |_| 10.0);
    dir
}

fn params() -> SessionParams {
    SessionParams {
        source: "cepa".to_string(),
        iteration: "417".to_string(),
        cleaning: CleaningParams::default(),
        site: SiteConstants {
            dpfu_max: vec1![1.0],
            gain_elevation: vec1![1.0],
            tcal: 0.0,
            k: 1.0,
        },
        cuts: vec![],
        rest_frequencies: RestFrequencyTable::new(vec1![
            ("CH3OH 6.7 GHz".to_string(), 6_668_519_200.0),
            ("OH 6.035 GHz".to_string(), 6_035_092_000.0),
        ]),
        frequency_start_mhz: FSTART,
    }
}

fn make_session(dir: &Path, tsys: f64, tsys_resolver: Box<dyn TsysResolver>) -> Session {
    make_session_with_log(dir, &log_json(tsys), tsys_resolver)
}

fn make_session_with_log(
    dir: &Path,
    log_json: &str,
    tsys_resolver: Box<dyn TsysResolver>,
) -> Session {
    let log = ExperimentLog::from_json_str(log_json).unwrap();
    let pairs = discover_scan_pairs(dir).unwrap();
    Session::new(
        params(),
        log,
        pairs,
        tsys_resolver,
        Box::new(FixedVelocity(0.0)),
    )
    .unwrap()
}

#[test]
fn test_scan_number_from_path() {
    assert_eq!(
        scan_number_from_path(Path::new("/data/cepa_001_no0023.dat")).as_deref(),
        Some("23")
    );
    assert_eq!(
        scan_number_from_path(Path::new("w3oh_no1000.dat")).as_deref(),
        Some("1000")
    );
    assert!(scan_number_from_path(Path::new("cepa_no0000.dat")).is_none());
    assert!(scan_number_from_path(Path::new("cepa_n.dat")).is_none());
}

#[test]
fn test_discover_scan_pairs() {
    let dir = make_session_dir();
    write_scan(dir.path(), "cepa_001_no0005.dat", 10, |_| 1.0);
    let pairs = discover_scan_pairs(dir.path()).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].signal_scan, "1");
    assert_eq!(pairs[0].reference_scan, "2");
    assert_eq!(pairs[1].signal_scan, "3");
    assert_eq!(pairs[1].reference_scan, "4");
    assert_eq!(pairs[1].reference, dir.path().join("cepa_001_no0004.dat"));
}

#[test]
fn test_session_dir() {
    assert_eq!(
        session_dir(Path::new("/data"), "cepa", "417"),
        PathBuf::from("/data/cepa/417")
    );
}

#[test]
fn test_process_in_any_order() {
    let dir = make_session_dir();
    let mut session = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    assert_eq!(session.num_pairs(), 2);
    assert_eq!(session.pair_state(0), Some(PairState::Pending));

    let pair = session.process_pair(1).unwrap();
    assert_eq!(pair.index, 1);
    assert_eq!(pair.signal_scan, "3");
    assert_abs_diff_eq!(pair.elevation, 45.0);
    assert_eq!(pair.spectrum.x_trimmed.len(), 100 - 2 * (25 + 1));
    session.process_pair(0).unwrap();

    let acc = session.accumulator();
    assert_eq!(acc.len(), 2);
    assert_eq!(acc.pairs()[0].index, 1);
    assert_eq!(acc.pairs()[1].index, 0);
    let snr = acc.snr(0).unwrap();
    assert!(snr.u1.is_finite() && snr.u9.is_finite() && snr.average.is_finite());
    assert!(acc.snr(2).is_none());
    assert!(acc.corrected().is_empty());

    assert!(matches!(
        session.process_pair(1),
        Err(SessionError::PairAlreadyProcessed(1))
    ));
    assert!(matches!(
        session.process_pair(2),
        Err(SessionError::PairIndexOutOfRange { index: 2, num_pairs: 2 })
    ));
}

#[test]
fn test_batch_matches_interactive() {
    let dir = make_session_dir();
    let mut batch = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    batch.process_remaining().unwrap();

    let mut interactive = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    interactive.process_pair(0).unwrap();
    interactive.process_pair(1).unwrap();

    for (a, b) in batch
        .accumulator()
        .pairs()
        .iter()
        .zip(interactive.accumulator().pairs())
    {
        assert_eq!(a.index, b.index);
        assert_eq!(a.spectrum, b.spectrum);
    }
    assert_eq!(batch.accumulator().snr(1), interactive.accumulator().snr(1));

    // Nothing is left for a second batch.
    batch.process_remaining().unwrap();
    assert_eq!(batch.accumulator().len(), 2);
}

#[test]
fn test_finalize_averages_pairs() {
    let dir = make_session_dir();
    let mut session = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    session.process_pair(0).unwrap();
    assert!(matches!(
        session.finalize(),
        Err(SessionError::PairsPending(p)) if p == vec![1]
    ));
    session.process_pair(1).unwrap();

    let result = session.finalize().unwrap();
    assert_eq!(session.state(), SessionState::Finalized);
    assert_eq!(result.species, "CH3OH 6.7 GHz");
    assert_abs_diff_eq!(result.rest_frequency, 6_668_519_200.0);

    let acc = session.accumulator();
    let corrected = acc.corrected();
    assert_eq!(corrected.len(), 2);
    assert_eq!(result.num_channels(), corrected[0].u1.len());
    for i in 0..result.num_channels() {
        let mean = |f: &dyn Fn(&DopplerCorrectedSpectrum) -> f64| {
            corrected.iter().map(f).sum::<f64>() / 2.0
        };
        assert_abs_diff_eq!(result.u1[i], mean(&|c| c.u1[i]), epsilon = 1e-12);
        assert_abs_diff_eq!(result.u9[i], mean(&|c| c.u9[i]), epsilon = 1e-12);
        assert_abs_diff_eq!(result.velocity[i], mean(&|c| c.velocity[i]), epsilon = 1e-9);
    }
    // The pairs really are different.
    assert!(corrected[0].u1 != corrected[1].u1);

    // Velocities follow the sky frequencies of the trimmed axis.
    let x0 = acc.pairs()[0].spectrum.x_trimmed[0];
    let expected = velocity_axis(&[(x0 + FSTART) * 1e6], 0.0, 6_668_519_200.0)[0];
    assert_abs_diff_eq!(corrected[0].velocity[0], expected, epsilon = 1e-9);

    // No double averaging.
    assert!(matches!(
        session.finalize(),
        Err(SessionError::AlreadyFinalized)
    ));
    assert!(matches!(session.process_pair(0), Err(SessionError::Finalized)));

    let key = session.result_key().unwrap();
    assert_eq!(key.file_name(), "cepa_23_Mar_2021_100100_IRBENE_417.dat");
}

#[test]
fn test_finalize_without_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    assert_eq!(session.num_pairs(), 0);
    assert!(matches!(session.finalize(), Err(SessionError::NoPairs)));
}

#[test]
fn test_invalid_tsys() {
    let dir = make_session_dir();
    let mut session = make_session(dir.path(), 0.0, Box::new(RejectInvalidTsys));
    assert!(matches!(
        session.process_pair(0),
        Err(SessionError::Metadata(MetadataError::InvalidTsys { .. }))
    ));
    // A failed pair stays pending and nothing is accumulated.
    assert_eq!(session.pair_state(0), Some(PairState::Pending));
    assert!(session.accumulator().is_empty());

    let mut session = make_session(dir.path(), 0.0, Box::new(FixedTsys(100.0)));
    let pair = session.process_pair(0).unwrap();
    assert_eq!(pair.tsys, PairTsys { u1: 100.0, u9: 100.0 });
}

#[test]
fn test_pair_tsys_comes_from_reference_scan() {
    let dir = make_session_dir();
    let log = log_json_per_scan(|scan| if scan % 2 == 1 { 50.0 } else { 100.0 });
    let mut session = make_session_with_log(dir.path(), &log, Box::new(RejectInvalidTsys));
    let pair = session.process_pair(0).unwrap();
    assert_eq!(pair.tsys, PairTsys { u1: 100.0, u9: 100.0 });
    let spectrum = pair.spectrum.clone();

    // Both phases are calibrated with the reference scan's value.
    let mut uniform = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    assert_eq!(uniform.process_pair(0).unwrap().spectrum, spectrum);

    // So the signal scan's value isn't even looked at.
    let log = log_json_per_scan(|scan| if scan % 2 == 1 { 0.0 } else { 100.0 });
    let mut session = make_session_with_log(dir.path(), &log, Box::new(RejectInvalidTsys));
    assert_eq!(session.process_pair(0).unwrap().spectrum, spectrum);
}

#[test]
fn test_pairs_with_different_lengths_are_not_averaged() {
    let dir = make_session_dir();
    write_scan(dir.path(), "cepa_001_no0003.dat", 60, alternating(14.0, 6.0));
    write_scan(dir.path(), "cepa_001_no0004.dat", 60, |_| 10.0);
    let mut session = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    session.process_remaining().unwrap();
    assert!(matches!(
        session.finalize(),
        Err(SessionError::DimensionMismatch { pair: 1, .. })
    ));
    // The session can still be finalised after a failure, but it'll fail
    // the same way.
    assert_eq!(session.state(), SessionState::Collecting);
}

#[test]
fn test_missing_scan_in_log() {
    let dir = make_session_dir();
    write_scan(dir.path(), "cepa_001_no0005.dat", 100, |_| 1.0);
    write_scan(dir.path(), "cepa_001_no0006.dat", 100, |_| 1.0);
    let mut session = make_session(dir.path(), 100.0, Box::new(RejectInvalidTsys));
    assert!(matches!(
        session.process_pair(2),
        Err(SessionError::Metadata(MetadataError::MissingScan { .. }))
    ));
}

#[test]
fn test_species_vote() {
    let mut votes = IndexMap::new();
    votes.insert(1, (2, 5.0));
    votes.insert(0, (3, 1.0));
    assert_eq!(choose_species(&votes), 0);

    // Ties go to the strongest peak.
    votes.insert(1, (3, 5.0));
    assert_eq!(choose_species(&votes), 1);

    // Then to the earlier table entry.
    votes.insert(0, (3, 5.0));
    assert_eq!(choose_species(&votes), 0);
}
