// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use ndarray::prelude::*;

use super::common::InfoPrinter;
use crate::{
    constants::DEFAULT_NUM_SUBBANDS,
    dedisperse::align_subbands,
    portrait::{read_portrait, Portrait},
    ChimeWbError,
};

#[derive(Parser, Debug, Clone)]
pub(super) struct AlignArgs {
    /// The portrait dump (json) to align.
    #[clap(name = "PORTRAIT", parse(from_os_str))]
    pub(super) portrait: PathBuf,

    /// The number of subbands to average the channels into. Channels that
    /// don't fill a whole subband are dropped.
    #[clap(short, long, default_value_t = DEFAULT_NUM_SUBBANDS)]
    pub(super) subbands: usize,

    /// The DM correction to align the subbands at [pc/cm^3].
    #[clap(short, long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub(super) delta_dm: f64,

    /// Don't divide each subband profile by its peak.
    #[clap(long)]
    pub(super) no_normalise: bool,

    /// Plot the aligned subband profiles to this png file. Requires the
    /// "plotting" feature.
    #[clap(long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) plot: Option<PathBuf>,

    /// Plot the portrait, dedispersed at the DM correction, to this png file.
    /// Requires the "plotting" feature.
    #[clap(long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) portrait_plot: Option<PathBuf>,
}

/// Subband profiles shifted to a common phase.
#[derive(Debug)]
pub(super) struct AlignedSubbands {
    pub(super) frequencies: Vec<f64>,
    pub(super) shifts: Array1<i64>,
    pub(super) profiles: Vec<Array1<f64>>,
}

impl AlignArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), ChimeWbError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);

        #[cfg(not(feature = "plotting"))]
        if self.plot.is_some() || self.portrait_plot.is_some() {
            return Err(AlignArgsError::NoPlottingFeature.into());
        }
        if self.subbands == 0 {
            return Err(AlignArgsError::ZeroSubbands.into());
        }
        if !self.delta_dm.is_finite() {
            return Err(AlignArgsError::NonFiniteDeltaDm(self.delta_dm).into());
        }

        let mut printer = InfoPrinter::new("Aligning subbands".into());
        printer.push_line(format!("Portrait: {}", self.portrait.display()).into());
        printer.push_line(
            format!(
                "{} subbands at dDM = {} pc/cm^3{}",
                self.subbands,
                self.delta_dm,
                if self.no_normalise {
                    ""
                } else {
                    ", normalised"
                }
            )
            .into(),
        );
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let portrait = read_portrait(&self.portrait)?;
        let aligned = self.align(&portrait)?;
        for ((freq, shift), profile) in aligned
            .frequencies
            .iter()
            .zip(aligned.shifts.iter())
            .zip(aligned.profiles.iter())
        {
            info!(
                "{freq:>10.3} MHz: shifted by {shift:>5} bins, peak at bin {}",
                peak_bin(profile.view())
            );
        }

        #[cfg(feature = "plotting")]
        {
            if let Some(plot) = &self.plot {
                crate::plotting::plot_aligned_profiles(
                    &aligned.profiles,
                    portrait.phases().view(),
                    &aligned.frequencies,
                    self.delta_dm,
                    plot,
                )?;
                info!("Plotted the aligned profiles to {}", plot.display());
            }
            if let Some(plot) = &self.portrait_plot {
                let dedispersed = crate::dedisperse::dedisperse(&portrait, self.delta_dm);
                crate::plotting::plot_portrait(
                    dedispersed.view(),
                    portrait.channel_frequency(),
                    &format!("Dedispersed at dDM = {} pc/cm^3", self.delta_dm),
                    plot,
                )?;
                info!("Plotted the dedispersed portrait to {}", plot.display());
            }
        }

        Ok(())
    }

    /// Average the portrait into subbands and shift them to the phase of the
    /// highest-frequency subband.
    pub(super) fn align(&self, portrait: &Portrait) -> Result<AlignedSubbands, ChimeWbError> {
        let mut subbands = portrait.subbands(self.subbands)?;
        let dropped = portrait.num_channels() % self.subbands;
        if dropped > 0 {
            debug!("The last {dropped} channels don't fill a subband and are dropped");
        }
        if !self.no_normalise {
            for sb in subbands.iter_mut() {
                sb.normalise()?;
            }
        }

        let (profiles, shifts) = align_subbands(&subbands, self.delta_dm, portrait.bin_width());
        Ok(AlignedSubbands {
            frequencies: subbands.iter().map(|sb| sb.frequency).collect(),
            shifts,
            profiles,
        })
    }
}

/// The index of the first maximum of the profile.
fn peak_bin(profile: ArrayView1<f64>) -> usize {
    profile
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

#[derive(thiserror::Error, Debug)]
pub(super) enum AlignArgsError {
    #[cfg(not(feature = "plotting"))]
    #[error("chime-wbtoa was not compiled with the \"plotting\" feature.\nYou need to compile it from source with this feature to make plots.")]
    NoPlottingFeature,

    #[error("The number of subbands must be at least 1")]
    ZeroSubbands,

    #[error("The DM correction must be a finite number, but got {0}")]
    NonFiniteDeltaDm(f64),
}
