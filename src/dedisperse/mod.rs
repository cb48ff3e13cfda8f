// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dedispersion by whole phase bins.
//!
//! Lower frequencies arrive later than higher ones; the delay of a channel at
//! frequency f relative to the reference frequency f_ref is
//!
//! delay(f) = K * DM * (f^-2 - f_ref^-2)
//!
//! where K is [`DISPERSION_CONSTANT_S`]. The delay is converted to a whole
//! number of phase bins (rounding half to even, like numpy) and each channel's
//! profile is circularly rotated by that number of bins.


use ndarray::prelude::*;

use crate::{
    constants::DISPERSION_CONSTANT_S,
    portrait::{Portrait, Subband},
};

/// The dispersive delay of a signal at `freq_mhz` relative to
/// `reference_freq_mhz` \[s\]. Positive for `freq_mhz < reference_freq_mhz`
/// and a positive `delta_dm`.
#[inline]
pub fn dispersion_delay(freq_mhz: f64, reference_freq_mhz: f64, delta_dm: f64) -> f64 {
    DISPERSION_CONSTANT_S
        * delta_dm
        * (1.0 / (freq_mhz * freq_mhz) - 1.0 / (reference_freq_mhz * reference_freq_mhz))
}

/// For each channel frequency \[MHz\], the number of phase bins to shift its
/// profile by to remove a dispersion measure of `delta_dm` relative to
/// `reference_frequency` \[MHz\]. `bin_width` is the duration of one phase
/// bin \[s\] and must be positive. `delta_dm` must be finite; a NaN would
/// otherwise cast to shifts of zero and an infinity to `i64::MAX`.
///
/// Rounding is half-to-even, so a delay of exactly 2.5 bins is a shift of 2
/// and a delay of 3.5 bins is a shift of 4.
pub fn compute_shift_bins(
    channel_frequencies: ArrayView1<f64>,
    reference_frequency: f64,
    delta_dm: f64,
    bin_width: f64,
) -> Array1<i64> {
    debug_assert!(bin_width > 0.0);
    debug_assert!(delta_dm.is_finite(), "non-finite DM correction {delta_dm}");
    channel_frequencies.mapv(|f| {
        let delay = dispersion_delay(f, reference_frequency, delta_dm);
        (delay / bin_width).round_ties_even() as i64
    })
}

/// Circularly rotate a profile by `shift_bins`. Element `i` of the output is
/// element `(i - shift_bins) mod n` of the input, so a positive shift moves
/// the profile to later phase. Any integer is valid, including ones larger
/// than the number of bins.
pub fn apply_circular_shift(profile: ArrayView1<f64>, shift_bins: i64) -> Array1<f64> {
    let n = profile.len();
    let mut out = Array1::zeros(n);
    if n == 0 {
        return out;
    }

    let shift = shift_bins.rem_euclid(n as i64) as usize;
    out.slice_mut(s![shift..]).assign(&profile.slice(s![..n - shift]));
    out.slice_mut(s![..shift]).assign(&profile.slice(s![n - shift..]));
    out
}

/// Shift every channel of the portrait by its dispersive delay at `delta_dm`,
/// relative to the portrait's highest frequency. The portrait is untouched;
/// the shifted rows are returned.
pub fn dedisperse(portrait: &Portrait, delta_dm: f64) -> Array2<f64> {
    let shifts = compute_shift_bins(
        portrait.channel_frequency(),
        portrait.max_frequency(),
        delta_dm,
        portrait.bin_width(),
    );

    let mut shifted = Array2::zeros(portrait.channel_intensity().raw_dim());
    for ((mut out_row, row), &shift) in shifted
        .outer_iter_mut()
        .zip(portrait.channel_intensity().outer_iter())
        .zip(shifts.iter())
    {
        out_row.assign(&apply_circular_shift(row, shift));
    }
    shifted
}

/// Sum the channels of a (possibly dedispersed) portrait into a single
/// profile. The sum is unweighted.
pub fn frequency_collapse(channel_rows: ArrayView2<f64>) -> Array1<f64> {
    channel_rows.sum_axis(Axis(0))
}

/// Shift subband profiles by their dispersive delays at `delta_dm`, relative
/// to the highest subband frequency. Returns the shifted profiles and the
/// shift applied to each.
pub fn align_subbands(
    subbands: &[Subband],
    delta_dm: f64,
    bin_width: f64,
) -> (Vec<Array1<f64>>, Array1<i64>) {
    let freqs: Array1<f64> = subbands.iter().map(|sb| sb.frequency).collect();
    let reference = freqs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let shifts = compute_shift_bins(freqs.view(), reference, delta_dm, bin_width);
    let profiles = subbands
        .iter()
        .zip(shifts.iter())
        .map(|(sb, &shift)| apply_circular_shift(sb.profile.view(), shift))
        .collect();
    (profiles, shifts)
}
