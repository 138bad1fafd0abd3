// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use fscal::SessionResult;

use crate::{fscal, get_cmd_output, Session};

#[test]
fn test_calibrate_writes_result() {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "-12.5"])
        .ok();
    assert!(cmd.is_ok(), "calibrate failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("fscal calibrate complete."), "{stdout}");

    let result = SessionResult::read(&session.result_file()).unwrap();
    assert_eq!(result.species, "CH3OH 6.7 GHz");
    assert_eq!(result.num_channels(), result.velocity.len());
    assert!(result.velocity.iter().all(|v| v.is_finite()));
    assert!(result.u1.iter().chain(&result.u9).all(|a| a.is_finite()));
}

#[test]
fn test_calibrate_dry_run() {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .arg("--dry-run")
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(!session.output_dir().exists());
}

#[test]
fn test_calibrate_save_toml_reproduces_run() {
    let session = Session::new();
    let toml = session.path().join("args.toml");
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "0", "--dry-run", "--save-toml"])
        .arg(&toml)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(toml.exists());

    let cmd = fscal()
        .arg("calibrate")
        .arg(&toml)
        .arg("--no-progress-bars")
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(session.result_file().exists());
}

#[test]
fn test_calibrate_missing_session_fails() {
    let session = Session::new();
    let mut args = session.calibrate_args();
    let iteration = args.iter().position(|a| a == "417").unwrap();
    args[iteration] = "418".to_string();

    let cmd = fscal().args(args).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
}

#[test]
fn test_calibrate_with_tsys_override() {
    let session = Session::new();
    let cmd = fscal()
        .args(session.calibrate_args())
        .args(["--receiver-velocity", "0", "--tsys", "120"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(session.result_file().exists());
}

#[cfg(unix)]
#[test]
fn test_calibrate_with_dopset() {
    use std::os::unix::fs::PermissionsExt;

    let session = Session::new();
    let dopset = session.path().join("dopset");
    std::fs::write(
        &dopset,
        "#!/bin/sh\nprintf 'VelTotal;-12.2132\\nLSRshift;0.0\\n' > lsrShift.dat\n",
    )
    .unwrap();
    std::fs::set_permissions(&dopset, std::fs::Permissions::from_mode(0o755)).unwrap();

    let cmd = fscal()
        .args(session.calibrate_args())
        .arg("--dopset")
        .arg(&dopset)
        .arg("--dopset-dir")
        .arg(session.path())
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(session.result_file().exists());
}

#[cfg(unix)]
#[test]
fn test_calibrate_with_relative_dopset_paths() {
    use std::os::unix::fs::PermissionsExt;

    let session = Session::new();
    std::fs::create_dir(session.path().join("code")).unwrap();
    std::fs::create_dir(session.path().join("work")).unwrap();
    let dopset = session.path().join("code").join("dopset");
    std::fs::write(
        &dopset,
        "#!/bin/sh\nprintf 'VelTotal;-12.2132\\n' > lsrShift.dat\n",
    )
    .unwrap();
    std::fs::set_permissions(&dopset, std::fs::Permissions::from_mode(0o755)).unwrap();

    let cmd = fscal()
        .current_dir(session.path())
        .args(session.calibrate_args())
        .args(["--dopset", "code/dopset", "--dopset-dir", "work"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(session.path().join("work").join("lsrShift.dat").exists());
    assert!(session.result_file().exists());
}
