// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod calibrate;
mod no_stderr;
mod result_print;

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use indoc::indoc;
use tempfile::TempDir;

fn fscal() -> Command {
    Command::cargo_bin("fscal").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

const CONFIG: &str = indoc! {r#"
    [cleaning]
    smoothing_window = 5

    [sites.IRBENE]
    dpfu_max = [0.0387, 0.0264]
    gain_elevation = [-1.3e-5, 1.0e-3, 0.98]
    tcal = 3.0

    [cuts]
    cepa = [[0.45, 0.55]]

    [rest_frequencies]
    "CH3OH 6.7 GHz" = 6668519200.0
    "OH 6.035 GHz" = 6035092000.0
"#};

/// A session on disk: `data/cepa/417/` with two scan pairs, the experiment
/// log `logs/cepa_417log.dat` and `config.toml`.
struct Session {
    tmp: TempDir,
}

impl Session {
    fn new() -> Session {
        let tmp = TempDir::new().expect("couldn't make tmp dir");
        let scans = tmp.path().join("data").join("cepa").join("417");
        std::fs::create_dir_all(&scans).unwrap();
        for scan in 1..=4 {
            // Odd scans are signal scans with a maser line at channel 50.
            let amplitude = |i: usize| {
                let noise = 0.05 * ((i * 7 + scan) as f64).sin();
                if scan % 2 == 1 && (48..=52).contains(&i) {
                    14.0 + noise
                } else {
                    10.0 + noise
                }
            };
            let mut s = String::from("9999 9999 9999 0 0 0 0 0 0\n");
            for i in 0..100 {
                let a = amplitude(i);
                writeln!(s, "{} {a} {a} 0 0 0 0 0 0", i as f64 * 0.01).unwrap();
            }
            std::fs::write(scans.join(format!("cepa_417_no{scan:04}.dat")), s).unwrap();
        }

        let scans: Vec<String> = (1..=4)
            .map(|scan| {
                format!(
                    r#""{scan}": {{"Systemtemperature": ["100.5", 98.0], "elevation": "45.2",
                        "startTime": "09:5{scan}:00", "dates": "23 Mar 2021",
                        "Ra": ["22", "56", "18.1"], "Dec": ["62", "01", "49.5"],
                        "fs_frequencyfs": {}}}"#,
                    6668 + 2 * (scan % 2)
                )
            })
            .collect();
        let log = format!(
            r#"{{"header": {{"dates": "23 Mar 2021", "location": "IRBENE", "BBC": 0, "source": "cepa"}}, {}}}"#,
            scans.join(", ")
        );
        std::fs::create_dir(tmp.path().join("logs")).unwrap();
        std::fs::write(tmp.path().join("logs").join("cepa_417log.dat"), log).unwrap();
        std::fs::write(tmp.path().join("config.toml"), CONFIG).unwrap();

        Session { tmp }
    }

    fn path(&self) -> &Path {
        self.tmp.path()
    }

    fn output_dir(&self) -> PathBuf {
        self.path().join("out")
    }

    /// The result file a successful run writes.
    fn result_file(&self) -> PathBuf {
        self.output_dir()
            .join("cepa_23_Mar_2021_095100_IRBENE_417.dat")
    }

    /// The arguments to calibrate this session.
    fn calibrate_args(&self) -> Vec<String> {
        let p = |p: PathBuf| p.display().to_string();
        vec![
            "calibrate".to_string(),
            "--data-dir".to_string(),
            p(self.path().join("data")),
            "--source".to_string(),
            "cepa".to_string(),
            "--iteration".to_string(),
            "417".to_string(),
            "--logs-dir".to_string(),
            p(self.path().join("logs")),
            "--config".to_string(),
            p(self.path().join("config.toml")),
            "--output-dir".to_string(),
            p(self.output_dir()),
            "--no-progress-bars".to_string(),
        ]
    }
}
