// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_abs_diff_eq;
use indoc::indoc;
use tempfile::NamedTempFile;

use super::*;

fn write_tmp(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("Couldn't make tmp file");
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

const GOOD_SCAN: &str = indoc! {"
    9999 9999 9999 0 0 0 0 0 0
    0.0 10.0 20.0 0 0 0 0 0 0
    1.0 11.0 21.0 0 0 0 0 0 0

    2.0 12.0 22.0 0 0 0 0 0 0
    3.0 13.0 23.0 0 0 0 0 0 0
"};

#[test]
fn test_read_scan_drops_header_row() {
    let f = write_tmp(GOOD_SCAN);
    let scan = read_scan(f.path()).unwrap();
    assert_eq!(scan.num_channels(), 4);
    assert_abs_diff_eq!(scan.freqs()[0], 0.0);
    assert_abs_diff_eq!(scan.freqs()[3], 3.0);
    assert_abs_diff_eq!(scan.amplitudes(Polarisation::U1)[1], 11.0);
    assert_abs_diff_eq!(scan.amplitudes(Polarisation::U9)[2], 22.0);
}

#[test]
fn test_read_scan_missing_file() {
    let result = read_scan(Path::new("/does/not/exist.dat"));
    assert!(matches!(result, Err(ScanReadError::Open { .. })));
}

#[test]
fn test_read_scan_wrong_column_count() {
    let f = write_tmp(indoc! {"
        0 0 0 0 0 0 0 0 0
        0.0 10.0 20.0 0 0 0 0 0 0
        1.0 11.0 21.0 0 0 0 0 0
    "});
    match read_scan(f.path()) {
        Err(ScanReadError::ColumnCount { line, actual, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(actual, 8);
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_read_scan_bad_number() {
    let f = write_tmp(indoc! {"
        0 0 0 0 0 0 0 0 0
        0.0 10.0 x 0 0 0 0 0 0
        1.0 11.0 21.0 0 0 0 0 0 0
    "});
    assert!(matches!(
        read_scan(f.path()),
        Err(ScanReadError::ParseValue { line: 2, .. })
    ));
}

#[test]
fn test_read_scan_too_few_rows() {
    let f = write_tmp("0 0 0 0 0 0 0 0 0\n0.0 10.0 20.0 0 0 0 0 0 0\n");
    assert!(matches!(
        read_scan(f.path()),
        Err(ScanReadError::TooFewRows { .. })
    ));
}

#[test]
fn test_read_scan_non_monotonic() {
    let f = write_tmp(indoc! {"
        0 0 0 0 0 0 0 0 0
        0.0 10.0 20.0 0 0 0 0 0 0
        2.0 11.0 21.0 0 0 0 0 0 0
        1.0 12.0 22.0 0 0 0 0 0 0
    "});
    assert!(matches!(
        read_scan(f.path()),
        Err(ScanReadError::NonMonotonicFreqs { channel: 2, .. })
    ));
}

#[test]
fn test_pair_dimension_mismatch_is_not_truncated() {
    let signal = write_tmp(GOOD_SCAN);
    let reference = write_tmp(indoc! {"
        0 0 0 0 0 0 0 0 0
        0.0 10.0 20.0 0 0 0 0 0 0
        1.0 11.0 21.0 0 0 0 0 0 0
        2.0 12.0 22.0 0 0 0 0 0 0
    "});
    match read_scan_pair(signal.path(), reference.path()) {
        Err(ScanReadError::DimensionMismatch { signal, reference }) => {
            assert_eq!(signal, 4);
            assert_eq!(reference, 3);
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_pair_freq_mismatch() {
    let signal = RawScan::new(Array2::from_shape_fn((3, 9), |(r, c)| {
        if c == 0 {
            r as f64
        } else {
            1.0
        }
    }))
    .unwrap();
    let reference = RawScan::new(Array2::from_shape_fn((3, 9), |(r, c)| {
        if c == 0 {
            r as f64 * 2.0
        } else {
            1.0
        }
    }))
    .unwrap();
    assert!(matches!(
        check_pair_alignment(&signal, &reference),
        Err(ScanReadError::FreqMismatch { channel: 1 })
    ));
}

#[test]
fn test_pair_ok() {
    let signal = write_tmp(GOOD_SCAN);
    let reference = write_tmp(GOOD_SCAN);
    let (s, r) = read_scan_pair(signal.path(), reference.path()).unwrap();
    assert_eq!(s.num_channels(), r.num_channels());
}
