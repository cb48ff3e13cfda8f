// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pulse portraits: pulse intensity as a function of frequency channel and
//! pulse phase, with the metadata needed to dedisperse them.

mod error;
mod read;

pub use error::{PortraitError, PortraitReadError};
pub use read::{read_portrait, write_portrait};

use log::trace;
use ndarray::prelude::*;

/// A 2D array of pulse intensities with shape (num_channels, num_phase_bins).
/// Each row is the pulse profile of one frequency channel. Phase runs from 0
/// (inclusive) to 1 (exclusive).
///
/// A [`Portrait`] can only be made through [`Portrait::new`], so the shape
/// invariants always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Portrait {
    channel_intensity: Array2<f64>,

    /// The centre frequency of each channel \[MHz\].
    channel_frequency: Array1<f64>,

    /// Non-negative; zero means the channel is excluded from averaging.
    channel_weight: Array1<f64>,

    /// The rotation period used to fold the data \[s\].
    fold_period: f64,
}

impl Portrait {
    pub fn new(
        channel_intensity: Array2<f64>,
        channel_frequency: Array1<f64>,
        channel_weight: Array1<f64>,
        fold_period: f64,
    ) -> Result<Portrait, PortraitError> {
        let (num_channels, num_phase_bins) = channel_intensity.dim();
        if num_channels != channel_frequency.len() || num_channels != channel_weight.len() {
            return Err(PortraitError::InvalidShape {
                intensity_rows: num_channels,
                num_freqs: channel_frequency.len(),
                num_weights: channel_weight.len(),
            });
        }
        if num_channels == 0 {
            return Err(PortraitError::InvalidNoChannels);
        }
        if num_phase_bins == 0 {
            return Err(PortraitError::InvalidNoPhaseBins);
        }
        if !(fold_period.is_finite() && fold_period > 0.0) {
            return Err(PortraitError::InvalidFoldPeriod(fold_period));
        }
        if let Some((chan, &freq)) = channel_frequency
            .iter()
            .enumerate()
            .find(|(_, f)| !(f.is_finite() && **f > 0.0))
        {
            return Err(PortraitError::InvalidFrequency { chan, freq });
        }
        if let Some((chan, &weight)) = channel_weight
            .iter()
            .enumerate()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(PortraitError::InvalidWeight { chan, weight });
        }
        if let Some(((chan, bin), _)) = channel_intensity
            .indexed_iter()
            .find(|(_, i)| !i.is_finite())
        {
            return Err(PortraitError::InvalidIntensity { chan, bin });
        }

        trace!("New portrait with {num_channels} channels and {num_phase_bins} phase bins");
        Ok(Portrait {
            channel_intensity,
            channel_frequency,
            channel_weight,
            fold_period,
        })
    }

    pub fn num_channels(&self) -> usize {
        self.channel_intensity.len_of(Axis(0))
    }

    pub fn num_phase_bins(&self) -> usize {
        self.channel_intensity.len_of(Axis(1))
    }

    pub fn channel_intensity(&self) -> ArrayView2<f64> {
        self.channel_intensity.view()
    }

    pub fn channel_frequency(&self) -> ArrayView1<f64> {
        self.channel_frequency.view()
    }

    pub fn channel_weight(&self) -> ArrayView1<f64> {
        self.channel_weight.view()
    }

    /// \[s\]
    pub fn fold_period(&self) -> f64 {
        self.fold_period
    }

    /// The duration of a single phase bin \[s\].
    pub fn bin_width(&self) -> f64 {
        self.fold_period / self.num_phase_bins() as f64
    }

    /// The highest channel frequency \[MHz\]. Dedispersion is done relative to
    /// this frequency, as it suffers the least delay.
    pub fn max_frequency(&self) -> f64 {
        self.channel_frequency
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The phase of the start of each phase bin.
    pub fn phases(&self) -> Array1<f64> {
        let n = self.num_phase_bins();
        Array1::from_shape_fn(n, |i| i as f64 / n as f64)
    }

    /// Split the channels into `num_subbands` contiguous groups and get each
    /// group's weighted-average profile and frequency. Each subband has
    /// `num_channels / num_subbands` channels; any channels left over at the
    /// top of the band are not used.
    pub fn subbands(&self, num_subbands: usize) -> Result<Vec<Subband>, PortraitError> {
        if num_subbands == 0 || num_subbands > self.num_channels() {
            return Err(PortraitError::InvalidSubbandCount {
                num_subbands,
                num_channels: self.num_channels(),
            });
        }

        let chans_per_subband = self.num_channels() / num_subbands;
        (0..num_subbands)
            .map(|i_subband| {
                let first = i_subband * chans_per_subband;
                let last = first + chans_per_subband;
                let data = self.channel_intensity.slice(s![first..last, ..]);
                let weights = self.channel_weight.slice(s![first..last]);
                let freqs = self.channel_frequency.slice(s![first..last]);

                let total_weight = weights.sum();
                if total_weight <= 0.0 {
                    return Err(PortraitError::DegenerateWeight {
                        first,
                        last: last - 1,
                    });
                }

                // data.T * w, summed over channels.
                let profile = weights.dot(&data) / total_weight;
                let frequency = weights.dot(&freqs) / total_weight;
                Ok(Subband { profile, frequency })
            })
            .collect()
    }
}

/// A weighted average of a contiguous run of channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Subband {
    pub profile: Array1<f64>,

    /// The weighted-average frequency of the channels \[MHz\].
    pub frequency: f64,
}

impl Subband {
    /// Divide the profile by its peak value.
    pub fn normalise(&mut self) -> Result<(), PortraitError> {
        let peak = self
            .profile
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if peak.is_nan() || peak <= 0.0 {
            return Err(PortraitError::ZeroPeak {
                freq: self.frequency,
                peak,
            });
        }
        self.profile.mapv_inplace(|v| v / peak);
        Ok(())
    }
}
