// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{get_cmd_output, gyimager, write_vis};

#[test]
fn test_partition_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let data = write_vis(tmp_dir.path());
    let output = tmp_dir.path().join("spans.json");

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            "--data", &format!("{}", data.display()),
            "--w-max", "1000",
            "--image", "test.img",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "partition failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
