// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use crate::{chime_wbtoa, get_cmd_output, write_dispersed_portrait};

#[test]
fn test_dm_search_finds_injected_dm() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), 2e-3);
    let curve = tmp_dir.path().join("curve.json");

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "dm-search", &portrait.display().to_string(),
            "--num-trials", "51",
            "--curve", &curve.display().to_string(),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "dm-search failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Refined dDM"), "{stdout}");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&curve).unwrap()).unwrap();
    assert_abs_diff_eq!(json["best_delta_dm"].as_f64().unwrap(), 2e-3, epsilon = 1e-3);
}

#[test]
fn test_dm_search_edge_of_grid_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), 2e-3);

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "dm-search", &portrait.display().to_string(),
            "--min-dm", "-1e-2",
            "--max-dm", "1e-3",
            "--num-trials", "23",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("widen"), "{stderr}");
}

#[test]
fn test_dm_search_missing_portrait_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = chime_wbtoa()
        .args([
            "dm-search",
            &tmp_dir.path().join("nothing.json").display().to_string(),
        ])
        .assert();
    cmd.failure().code(1);
}
