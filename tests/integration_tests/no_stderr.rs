// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{chime_wbtoa, get_cmd_output, write_dispersed_portrait};

#[test]
fn test_dm_search_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), -4e-3);

    let cmd = chime_wbtoa()
        .args(["dm-search", &portrait.display().to_string(), "-v"])
        .ok();
    assert!(cmd.is_ok(), "dm-search failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_align_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), 0.0);

    let cmd = chime_wbtoa()
        .args(["align", &portrait.display().to_string(), "--no-normalise"])
        .ok();
    assert!(cmd.is_ok(), "align failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
