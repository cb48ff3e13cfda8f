// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use log::{debug, info, trace};

use super::common::{display_warnings, InfoPrinter, Warn};
use crate::{
    constants::{
        DEFAULT_DM_SEARCH_MAX, DEFAULT_DM_SEARCH_MIN, DEFAULT_DM_SEARCH_NUM_TRIALS,
        DISPERSION_CONSTANT_S,
    },
    dm_search::{linear_trial_grid, search},
    io::{can_write_to_file, FileCheckError},
    portrait::read_portrait,
    ChimeWbError,
};

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct DmSearchArgs {
    /// The portrait dump (json) to search.
    #[clap(name = "PORTRAIT", parse(from_os_str))]
    pub(super) portrait: PathBuf,

    /// The smallest trial DM correction [pc/cm^3].
    #[clap(long, allow_hyphen_values = true, default_value_t = DEFAULT_DM_SEARCH_MIN)]
    pub(super) min_dm: f64,

    /// The largest trial DM correction [pc/cm^3].
    #[clap(long, allow_hyphen_values = true, default_value_t = DEFAULT_DM_SEARCH_MAX)]
    pub(super) max_dm: f64,

    /// The number of trial DM corrections, evenly spaced between the smallest
    /// and largest (inclusive).
    #[clap(short, long, default_value_t = DEFAULT_DM_SEARCH_NUM_TRIALS)]
    pub(super) num_trials: usize,

    /// Write the trial DM corrections and their scores to this json file.
    #[clap(long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) curve: Option<PathBuf>,

    /// Plot the scores and the fitted parabola to this png file. Requires the
    /// "plotting" feature.
    #[clap(long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) plot: Option<PathBuf>,
}

impl DmSearchArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), ChimeWbError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);

        let Self {
            portrait,
            min_dm,
            max_dm,
            num_trials,
            curve,
            plot,
        } = self;

        #[cfg(not(feature = "plotting"))]
        if plot.is_some() {
            return Err(DmSearchArgsError::NoPlottingFeature.into());
        }
        for output in curve.iter().chain(plot.iter()) {
            can_write_to_file(output).map_err(DmSearchArgsError::Output)?;
        }

        let portrait_file = portrait;
        let portrait = read_portrait(&portrait_file)?;
        let trial_offsets = linear_trial_grid(min_dm, max_dm, num_trials)?;

        let min_freq = portrait
            .channel_frequency()
            .fold(f64::INFINITY, |acc, &f| acc.min(f));

        let mut printer = InfoPrinter::new("DM search".into());
        printer.push_block(vec![
            format!("Portrait: {}", portrait_file.display()).into(),
            format!(
                "{} channels between {:.3} and {:.3} MHz, {} phase bins",
                portrait.num_channels(),
                min_freq,
                portrait.max_frequency(),
                portrait.num_phase_bins()
            )
            .into(),
            format!("Fold period: {} s", portrait.fold_period()).into(),
        ]);
        printer.push_line(
            format!("{num_trials} trial dDMs from {min_dm} to {max_dm} pc/cm^3").into(),
        );
        printer.display();
        // The largest shift between neighbouring trials is that of the lowest
        // channel.
        let grid_step = trial_offsets[1] - trial_offsets[0];
        let max_shift = DISPERSION_CONSTANT_S
            * grid_step
            * (min_freq.powi(-2) - portrait.max_frequency().powi(-2))
            / portrait.bin_width();
        if max_shift < 0.5 {
            format!("The trial dDM step ({grid_step:e}) shifts no channel by a whole phase bin; neighbouring trials will score identically").warn();
        }
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let result = search(&portrait, &trial_offsets)?;
        info!(
            "Best trial dDM: {} (index {}, score {})",
            trial_offsets[result.best_index],
            result.best_index,
            result.best_score()
        );
        info!("Refined dDM: {} pc/cm^3", result.best_delta_dm);

        if let Some(curve) = curve {
            let mut writer = BufWriter::new(File::create(&curve)?);
            serde_json::to_writer_pretty(&mut writer, &result)?;
            writer.flush()?;
            info!("Wrote the score curve to {}", curve.display());
        }

        #[cfg(feature = "plotting")]
        if let Some(plot) = plot {
            crate::plotting::plot_dm_curve(&result, &plot)?;
            info!("Plotted the score curve to {}", plot.display());
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum DmSearchArgsError {
    #[cfg(not(feature = "plotting"))]
    #[error("chime-wbtoa was not compiled with the \"plotting\" feature.\nYou need to compile it from source with this feature to make plots.")]
    NoPlottingFeature,

    #[error("Can't write an output file: {0}")]
    Output(FileCheckError),
}
