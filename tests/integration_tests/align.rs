// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{chime_wbtoa, get_cmd_output, write_dispersed_portrait};

#[test]
fn test_align_logs_every_subband() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), 3e-3);

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "align", &portrait.display().to_string(),
            "--subbands", "4",
            "--delta-dm", "3e-3",
        ])
        .ok();
    assert!(cmd.is_ok(), "align failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert_eq!(stdout.matches("shifted by").count(), 4, "{stdout}");
    assert!(stdout.contains("760.000 MHz: shifted by     0 bins"), "{stdout}");
}

#[cfg(not(feature = "plotting"))]
#[test]
fn test_align_plot_needs_feature() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let portrait = write_dispersed_portrait(tmp_dir.path(), 3e-3);

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "align", &portrait.display().to_string(),
            "--plot", &tmp_dir.path().join("aligned.png").display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("plotting"), "{stderr}");
}
