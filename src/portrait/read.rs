// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Portrait dumps. The archive format itself is read by external tools; those
//! tools dump the averaged portrait, channel frequencies, channel weights and
//! fold period into a JSON file, which is what is read here.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Portrait, PortraitReadError};

/// The on-disk representation of a [`Portrait`].
#[derive(Debug, Serialize, Deserialize)]
struct PortraitFile {
    /// \[s\]
    fold_period: f64,

    /// \[MHz\]
    #[serde(alias = "freqs")]
    channel_frequency: Vec<f64>,

    #[serde(alias = "weights")]
    channel_weight: Vec<f64>,

    /// One row per channel.
    #[serde(alias = "port")]
    channel_intensity: Vec<Vec<f64>>,
}

pub fn read_portrait<P: AsRef<Path>>(file: P) -> Result<Portrait, PortraitReadError> {
    let file = file.as_ref();
    debug!("Reading portrait from '{}'", file.display());
    if !file.exists() {
        return Err(PortraitReadError::NotFound(file.to_path_buf()));
    }

    let reader = BufReader::new(File::open(file)?);
    let PortraitFile {
        fold_period,
        channel_frequency,
        channel_weight,
        channel_intensity,
    } = serde_json::from_reader(reader).map_err(|e| PortraitReadError::Decode {
        file: file.to_path_buf(),
        err: e.to_string(),
    })?;

    let num_channels = channel_intensity.len();
    let num_phase_bins = channel_intensity.first().map(|r| r.len()).unwrap_or(0);
    if let Some((row, r)) = channel_intensity
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != num_phase_bins)
    {
        return Err(PortraitReadError::Ragged {
            file: file.to_path_buf(),
            row,
            len: r.len(),
            expected: num_phase_bins,
        });
    }
    let intensity = Array2::from_shape_vec(
        (num_channels, num_phase_bins),
        channel_intensity.into_iter().flatten().collect(),
    )
    .map_err(|e| PortraitReadError::Decode {
        file: file.to_path_buf(),
        err: e.to_string(),
    })?;

    let portrait = Portrait::new(
        intensity,
        Array1::from(channel_frequency),
        Array1::from(channel_weight),
        fold_period,
    )?;
    debug!(
        "Portrait has {} channels ({:.3} to {:.3} MHz), {} phase bins, period {} s",
        portrait.num_channels(),
        portrait
            .channel_frequency()
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min),
        portrait.max_frequency(),
        portrait.num_phase_bins(),
        portrait.fold_period()
    );
    Ok(portrait)
}

pub fn write_portrait<P: AsRef<Path>>(
    file: P,
    portrait: &Portrait,
) -> Result<(), PortraitReadError> {
    let file = file.as_ref();
    let pf = PortraitFile {
        fold_period: portrait.fold_period(),
        channel_frequency: portrait.channel_frequency().to_vec(),
        channel_weight: portrait.channel_weight().to_vec(),
        channel_intensity: portrait
            .channel_intensity()
            .outer_iter()
            .map(|row| row.to_vec())
            .collect(),
    };
    let mut writer = BufWriter::new(File::create(file)?);
    serde_json::to_writer(&mut writer, &pf).map_err(|e| PortraitReadError::Decode {
        file: file.to_path_buf(),
        err: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}
