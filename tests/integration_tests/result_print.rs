// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{fscal, get_cmd_output, Session};

fn calibrated_session() -> Session {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "0"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    session
}

#[test]
fn test_result_print_to_stdout() {
    let session = calibrated_session();
    let cmd = fscal()
        .arg("result-print")
        .arg(session.result_file())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("# species: CH3OH 6.7 GHz"), "{stdout}");
    assert!(stdout.contains("# rest frequency: 6668519200 Hz"), "{stdout}");
}

#[test]
fn test_result_print_to_file() {
    let session = calibrated_session();
    let text = session.path().join("result.txt");
    let cmd = fscal()
        .arg("print-result")
        .arg(session.result_file())
        .arg("-o")
        .arg(&text)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let contents = std::fs::read_to_string(&text).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("# species: CH3OH 6.7 GHz"));
    let data_rows: Vec<&str> = lines.filter(|l| !l.starts_with('#')).collect();
    assert!(!data_rows.is_empty());
    assert!(data_rows.iter().all(|row| row.split_whitespace().count() == 3));
}

#[test]
fn test_result_print_missing_file() {
    let session = Session::new();
    let cmd = fscal()
        .arg("result-print")
        .arg(session.path().join("missing.dat"))
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
}
