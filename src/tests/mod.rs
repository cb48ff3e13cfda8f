// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests.

use ndarray::prelude::*;

use crate::{
    dedisperse::{apply_circular_shift, compute_shift_bins},
    portrait::Portrait,
};

pub(crate) const NUM_CHANNELS: usize = 16;
pub(crate) const NUM_BINS: usize = 1024;
// 1 microsecond phase bins.
pub(crate) const FOLD_PERIOD: f64 = 1.024e-3;

/// A Gaussian pulse (centred on bin 512) in every channel between 400 and 800
/// MHz, arranged so that dedispersing by `delta_dm` lines the channels up
/// again.
pub(crate) fn get_dispersed_portrait(delta_dm: f64) -> Portrait {
    let freqs = Array1::linspace(400.0, 800.0, NUM_CHANNELS);
    let pulse = Array1::from_shape_fn(NUM_BINS, |i| {
        let x = (i as f64 - 512.0) / 20.0;
        (-0.5 * x * x).exp()
    });
    let shifts = compute_shift_bins(
        freqs.view(),
        800.0,
        delta_dm,
        FOLD_PERIOD / NUM_BINS as f64,
    );
    let mut intensity = Array2::zeros((NUM_CHANNELS, NUM_BINS));
    for (mut row, &s) in intensity.outer_iter_mut().zip(shifts.iter()) {
        row.assign(&apply_circular_shift(pulse.view(), -s));
    }
    Portrait::new(intensity, freqs, Array1::ones(NUM_CHANNELS), FOLD_PERIOD).unwrap()
}
