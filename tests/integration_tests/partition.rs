// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::{get_cmd_output, gyimager, write_vis};

fn read_json(file: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap()
}

#[test]
fn test_partition_w_planes() {
    let tmp_dir = TempDir::new().unwrap();
    let data = write_vis(tmp_dir.path());
    let output = tmp_dir.path().join("spans.json");

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            "--data", &format!("{}", data.display()),
            "--w-max", "1000",
            "--image", "test.img",
            "--uv-min", "0.01",
            "--time-window", "100",
            "--num-w-planes", "11",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "partition failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("8 of 12 rows"), "{stdout}");

    // Plane of w = 2 is round(sqrt(2) * 10 / sqrt(1000)) = 0, and w ~ 600 is
    // round(sqrt(600) * 10 / sqrt(1000)) = 8. The 100 s window covers two
    // timesteps.
    assert_eq!(
        read_json(&output),
        json!({
            "buckets": [
                { "w_index": 0, "spans": [[0, 3], [6, 9]] },
                { "w_index": 8, "spans": [[1, 4], [7, 10]] }
            ]
        })
    );
}

#[test]
fn test_partition_without_w_planes() {
    let tmp_dir = TempDir::new().unwrap();
    let data = write_vis(tmp_dir.path());
    let output = tmp_dir.path().join("spans.json");

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            "--data", &format!("{}", data.display()),
            "--w-max", "1000",
            "--image", "test.img",
            "--no-w-planes",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "partition failed: {}", cmd.err().unwrap());

    // With the default uv cut of 0, the short baseline is included too. The
    // default time window covers everything.
    assert_eq!(
        read_json(&output),
        json!([[0, 3, 6, 9], [1, 4, 7, 10], [2, 5, 8, 11]])
    );
}

#[test]
fn test_partition_dry_run() {
    let tmp_dir = TempDir::new().unwrap();
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
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "partition failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run -- exiting now."), "{stdout}");
    assert!(!output.exists());
}

#[test]
fn test_partition_arg_file_and_save_toml() {
    let tmp_dir = TempDir::new().unwrap();
    let data = write_vis(tmp_dir.path());
    let output = tmp_dir.path().join("spans.json");
    let arg_file = tmp_dir.path().join("args.json");
    fs::write(
        &arg_file,
        json!({
            "data": data,
            "output": output,
            "imaging": { "w_max": 1000.0, "image": "test.img", "time_window": 0.0 }
        })
        .to_string(),
    )
    .unwrap();
    let saved = tmp_dir.path().join("saved.toml");

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            &format!("{}", arg_file.display()),
            "--no-w-planes",
            "--save-toml", &format!("{}", saved.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "partition failed: {}", cmd.err().unwrap());

    // A zero time window gives a span per row.
    let spans = read_json(&output);
    assert_eq!(spans.as_array().unwrap().len(), 12);

    let saved = fs::read_to_string(saved).unwrap();
    assert!(saved.contains("no_w_planes = true"), "{saved}");
    assert!(saved.contains("w_max = 1000.0"), "{saved}");
}

#[test]
fn test_partition_without_w_max_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let data = write_vis(tmp_dir.path());

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            "--data", &format!("{}", data.display()),
            "--image", "test.img",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("IMAGING"), "{stderr}");
}

#[test]
fn test_partition_verbose_logging() {
    let tmp_dir = TempDir::new().unwrap();
    let data = write_vis(tmp_dir.path());

    #[rustfmt::skip]
    let cmd = gyimager()
        .args([
            "partition",
            "--data", &format!("{}", data.display()),
            "--w-max", "1000",
            "--image", "test.img",
            "--dry-run",
            "-vvv",
        ])
        .ok();
    assert!(cmd.is_ok(), "partition failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Built from git commit"), "{stdout}");
    // The most verbose format names the module of each message.
    assert!(stdout.contains("gyimager::cli"), "{stdout}");
    assert!(stdout.contains("uv range: (0, 100000) kλ"), "{stdout}");
}
