// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{constants::MIN_DM_SEARCH_NUM_TRIALS, math::QuadraticFitError};

#[derive(Error, Debug)]
pub enum DmSearchError {
    #[error(
        "At least {} trial DM offsets are needed, but {0} were supplied",
        MIN_DM_SEARCH_NUM_TRIALS
    )]
    TooFewTrials(usize),

    #[error("Trial DM offsets must be finite and strictly increasing; offset {index} ({value}) breaks this")]
    UnsortedTrials { index: usize, value: f64 },

    #[error("Invalid trial DM grid: {0}")]
    InvalidGrid(String),

    #[error("The best trial DM offset ({best_delta_dm}, index {index} of {num_trials}) is too close to the edge of the trial grid to refine; widen the grid")]
    OutOfRange {
        index: usize,
        num_trials: usize,
        best_delta_dm: f64,
    },

    #[error("The scores around the best trial DM offset don't constrain a parabola: {0}")]
    DegenerateFit(String),
}

impl From<QuadraticFitError> for DmSearchError {
    fn from(e: QuadraticFitError) -> Self {
        DmSearchError::DegenerateFit(e.to_string())
    }
}
