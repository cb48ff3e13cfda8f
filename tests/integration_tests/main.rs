// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod align;
mod dm_search;
mod no_stderr;
mod run;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use ndarray::prelude::*;

use chime_wbtoa::{
    dedisperse::{apply_circular_shift, compute_shift_bins},
    write_portrait, Portrait,
};

fn chime_wbtoa() -> Command {
    Command::cargo_bin("chime-wbtoa").unwrap()
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

/// Write a portrait of a Gaussian pulse dispersed by `delta_dm` across 16
/// channels between 400 and 800 MHz.
fn write_dispersed_portrait(dir: &Path, delta_dm: f64) -> PathBuf {
    let (num_chans, num_bins, fold_period) = (16, 1024, 1.024e-3);
    let freqs = Array1::linspace(400.0, 800.0, num_chans);
    let pulse = Array1::from_shape_fn(num_bins, |i| {
        let x = (i as f64 - 512.0) / 20.0;
        (-0.5 * x * x).exp()
    });
    let shifts = compute_shift_bins(
        freqs.view(),
        800.0,
        delta_dm,
        fold_period / num_bins as f64,
    );
    let mut intensity = Array2::zeros((num_chans, num_bins));
    for (mut row, &s) in intensity.outer_iter_mut().zip(shifts.iter()) {
        row.assign(&apply_circular_shift(pulse.view(), -s));
    }
    let portrait =
        Portrait::new(intensity, freqs, Array1::ones(num_chans), fold_period).unwrap();

    let file = dir.join("portrait.json");
    write_portrait(&file, &portrait).unwrap();
    file
}
