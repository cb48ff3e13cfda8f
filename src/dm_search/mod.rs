// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Search for the DM correction that makes a portrait's frequency-collapsed
//! profile as sharp as possible.
//!
//! Each trial DM offset dedisperses the portrait, collapses it over frequency
//! and scores the result by the standard deviation over phase bins. A
//! correctly dedispersed pulse is sharply peaked (high standard deviation),
//! whereas a wrong DM smears it out. The best trial on the grid is then
//! refined by fitting a parabola to the scores around it.

mod error;
#[cfg(test)]
mod tests;

pub use error::DmSearchError;

use log::{debug, trace};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    constants::{DEGENERATE_SCORE_TOLERANCE, MIN_DM_SEARCH_NUM_TRIALS},
    dedisperse::{dedisperse, frequency_collapse},
    math::{fit_quadratic, linspace, QuadraticFit},
    portrait::Portrait,
};

/// The outcome of a DM search.
#[derive(Debug, Clone, Serialize)]
pub struct DmSearchResult {
    /// The refined DM correction (the vertex of the fitted parabola)
    /// \[pc cm^-3\].
    pub best_delta_dm: f64,

    /// The index of the best-scoring trial.
    pub best_index: usize,

    #[serde(skip)]
    pub fit: QuadraticFit,

    pub trial_offsets: Vec<f64>,

    /// The score of each trial offset, in the same order.
    pub scores: Vec<f64>,
}

impl DmSearchResult {
    /// The score of the best trial on the grid.
    pub fn best_score(&self) -> f64 {
        self.scores[self.best_index]
    }
}

/// The sharpness of the portrait dedispersed at `delta_dm`: the population
/// standard deviation of the frequency-collapsed profile.
pub fn score(delta_dm: f64, portrait: &Portrait) -> f64 {
    frequency_collapse(dedisperse(portrait, delta_dm).view()).std(0.0)
}

/// Build a trial grid of `num` offsets evenly spaced over `[min, max]`.
pub fn linear_trial_grid(min: f64, max: f64, num: usize) -> Result<Vec<f64>, DmSearchError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(DmSearchError::InvalidGrid(format!(
            "the grid edges must be finite (got {min} and {max})"
        )));
    }
    if min >= max {
        return Err(DmSearchError::InvalidGrid(format!(
            "the minimum ({min}) must be smaller than the maximum ({max})"
        )));
    }
    if num < MIN_DM_SEARCH_NUM_TRIALS {
        return Err(DmSearchError::TooFewTrials(num));
    }
    Ok(linspace(min, max, num))
}

/// Score the portrait at every trial DM offset, then refine the best trial
/// with a parabola fitted to the four trials `[j - 2, j + 2)` around the best
/// index `j`.
///
/// The trial offsets must be strictly increasing and number at least 5. The
/// best trial must have two trials below it and two above it, otherwise
/// [`DmSearchError::OutOfRange`] is returned; pad the grid so that the optimum
/// isn't near its edges. Ties in the score go to the lowest index.
pub fn search(portrait: &Portrait, trial_offsets: &[f64]) -> Result<DmSearchResult, DmSearchError> {
    validate_trials(trial_offsets)?;
    debug!(
        "Searching {} trial DM offsets between {} and {}",
        trial_offsets.len(),
        trial_offsets[0],
        trial_offsets[trial_offsets.len() - 1]
    );

    // The trials are independent; `collect` keeps them in grid order.
    let scores: Vec<f64> = trial_offsets
        .par_iter()
        .map(|&delta_dm| score(delta_dm, portrait))
        .collect();

    // A flat profile scores ~0 everywhere but not exactly 0, so score spreads
    // are compared against the scale of the data.
    let data_scale = frequency_collapse(portrait.channel_intensity())
        .iter()
        .fold(0.0, |acc: f64, v| acc.max(v.abs()));
    let tolerance = DEGENERATE_SCORE_TOLERANCE * data_scale.max(f64::MIN_POSITIVE);
    let (best_index, fit) = refine_best_trial(trial_offsets, &scores, tolerance)?;
    let best_delta_dm = fit.vertex();
    debug!("Refined DM correction: {best_delta_dm}");

    Ok(DmSearchResult {
        best_delta_dm,
        best_index,
        fit,
        trial_offsets: trial_offsets.to_vec(),
        scores,
    })
}

/// Find the best-scoring trial and fit a parabola to the window around it.
/// Scores whose spread is within `tolerance` are considered equal. The fit
/// must open downwards and have a finite vertex.
fn refine_best_trial(
    trial_offsets: &[f64],
    scores: &[f64],
    tolerance: f64,
) -> Result<(usize, QuadraticFit), DmSearchError> {
    let num_trials = trial_offsets.len();
    if spread(scores) <= tolerance {
        return Err(DmSearchError::DegenerateFit(format!(
            "all {num_trials} trial DM offsets score the same ({})",
            scores[0]
        )));
    }

    let best_index = first_max_index(scores);
    trace!(
        "Best trial: index {best_index}, dDM {}, score {}",
        trial_offsets[best_index],
        scores[best_index]
    );
    if best_index < 2 || best_index > num_trials - 3 {
        return Err(DmSearchError::OutOfRange {
            index: best_index,
            num_trials,
            best_delta_dm: trial_offsets[best_index],
        });
    }

    let window = best_index - 2..best_index + 2;
    let window_scores = &scores[window.clone()];
    if spread(window_scores) <= tolerance {
        return Err(DmSearchError::DegenerateFit(format!(
            "the scores of trials {} to {} are all equal ({})",
            window.start,
            window.end - 1,
            scores[best_index]
        )));
    }

    let fit = fit_quadratic(&trial_offsets[window.clone()], window_scores)?;
    if !fit.is_concave() {
        return Err(DmSearchError::DegenerateFit(format!(
            "the parabola fitted to trials {} to {} opens upwards (a = {}), so its vertex is a minimum",
            window.start,
            window.end - 1,
            fit.a
        )));
    }
    if !fit.vertex().is_finite() {
        return Err(DmSearchError::DegenerateFit(format!(
            "the fitted vertex is not finite ({})",
            fit.vertex()
        )));
    }

    Ok((best_index, fit))
}

fn validate_trials(trial_offsets: &[f64]) -> Result<(), DmSearchError> {
    if trial_offsets.len() < MIN_DM_SEARCH_NUM_TRIALS {
        return Err(DmSearchError::TooFewTrials(trial_offsets.len()));
    }
    if let Some((index, &value)) = trial_offsets
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(DmSearchError::UnsortedTrials { index, value });
    }
    if let Some(index) = trial_offsets.windows(2).position(|w| w[1] <= w[0]) {
        return Err(DmSearchError::UnsortedTrials {
            index: index + 1,
            value: trial_offsets[index + 1],
        });
    }
    Ok(())
}

/// The index of the first occurrence of the maximum value. `values` must not
/// be empty.
fn first_max_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn spread(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}
