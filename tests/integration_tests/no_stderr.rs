// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use crate::{fscal, get_cmd_output, Session};

#[test]
fn test_calibrate_no_stderr() {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "0"])
        .ok();
    assert!(
        cmd.is_ok(),
        "calibrate failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_result_print_no_stderr() {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "0"])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());

    let cmd = fscal()
        .arg("result-print")
        .arg(session.result_file())
        .ok();
    assert!(
        cmd.is_ok(),
        "result-print failed on a fresh result: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
