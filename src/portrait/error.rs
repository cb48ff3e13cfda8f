// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortraitError {
    #[error("The portrait has {intensity_rows} intensity rows, {num_freqs} channel frequencies and {num_weights} channel weights; these must all be equal")]
    InvalidShape {
        intensity_rows: usize,
        num_freqs: usize,
        num_weights: usize,
    },

    #[error("The portrait has no frequency channels")]
    InvalidNoChannels,

    #[error("The portrait has no phase bins")]
    InvalidNoPhaseBins,

    #[error("The portrait's fold period must be positive and finite, but it is {0} s")]
    InvalidFoldPeriod(f64),

    #[error("Channel {chan} has a frequency of {freq} MHz; frequencies must be positive and finite")]
    InvalidFrequency { chan: usize, freq: f64 },

    #[error("Channel {chan} has a weight of {weight}; weights must be non-negative and finite")]
    InvalidWeight { chan: usize, weight: f64 },

    #[error("Channel {chan}, phase bin {bin} has a non-finite intensity")]
    InvalidIntensity { chan: usize, bin: usize },

    #[error("Cannot split {num_channels} channels into {num_subbands} subbands")]
    InvalidSubbandCount {
        num_subbands: usize,
        num_channels: usize,
    },

    #[error("Channels {first} to {last} have a total weight of zero; cannot form a weighted average")]
    DegenerateWeight { first: usize, last: usize },

    #[error("The subband at {freq} MHz has a non-positive peak ({peak}); cannot normalise it")]
    ZeroPeak { freq: f64, peak: f64 },
}

#[derive(Error, Debug)]
pub enum PortraitReadError {
    #[error("Couldn't decode the portrait in '{file}': {err}")]
    Decode { file: PathBuf, err: String },

    #[error("The portrait in '{file}' has ragged intensity rows (row {row} has {len} bins, expected {expected})")]
    Ragged {
        file: PathBuf,
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Portrait file '{0}' doesn't exist")]
    NotFound(PathBuf),

    #[error(transparent)]
    Portrait(#[from] PortraitError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
