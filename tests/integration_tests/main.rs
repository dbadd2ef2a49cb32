// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod no_stderr;
mod partition;

use std::{
    fs,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use indoc::indoc;

fn gyimager() -> Command {
    Command::cargo_bin("gyimager").unwrap()
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

/// Write a small set of visibilities into `dir`. There are three baselines
/// over four timesteps, 60 seconds apart; baseline (1, 2) is too short to pass
/// the default uv cut of anything above 0.01 kλ and baseline (0, 2) has a
/// large w.
fn write_vis(dir: &Path) -> PathBuf {
    let json = indoc! {r#"
        {
            "phase_reference": [0.0, -0.47],
            "reference_frequency": 150e6,
            "channel_frequencies": [150e6, 150.04e6, 150.08e6],
            "channel_widths": [40e3, 40e3, 40e3],
            "num_correlations": 4,
            "rows": [
                { "antenna1": 0, "antenna2": 1, "uvw": [120.0, 30.0, 2.0], "time": 0.0 },
                { "antenna1": 0, "antenna2": 2, "uvw": [300.0, -80.0, 600.0], "time": 0.0 },
                { "antenna1": 1, "antenna2": 2, "uvw": [0.01, 0.0, 0.0], "time": 0.0 },
                { "antenna1": 0, "antenna2": 1, "uvw": [121.0, 31.0, 2.0], "time": 60.0 },
                { "antenna1": 0, "antenna2": 2, "uvw": [301.0, -79.0, 601.0], "time": 60.0 },
                { "antenna1": 1, "antenna2": 2, "uvw": [0.01, 0.0, 0.0], "time": 60.0 },
                { "antenna1": 0, "antenna2": 1, "uvw": [122.0, 32.0, 2.0], "time": 120.0 },
                { "antenna1": 0, "antenna2": 2, "uvw": [302.0, -78.0, 602.0], "time": 120.0 },
                { "antenna1": 1, "antenna2": 2, "uvw": [0.01, 0.0, 0.0], "time": 120.0 },
                { "antenna1": 0, "antenna2": 1, "uvw": [123.0, 33.0, 2.0], "time": 180.0 },
                { "antenna1": 0, "antenna2": 2, "uvw": [303.0, -77.0, 603.0], "time": 180.0 },
                { "antenna1": 1, "antenna2": 2, "uvw": [0.01, 0.0, 0.0], "time": 180.0 }
            ]
        }
    "#};
    let file = dir.join("vis.json");
    fs::write(&file, json).unwrap();
    file
}
