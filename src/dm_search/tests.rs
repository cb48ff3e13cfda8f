// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;
use crate::{
    constants::{DEFAULT_DM_SEARCH_MAX, DEFAULT_DM_SEARCH_MIN},
    tests::{get_dispersed_portrait, FOLD_PERIOD, NUM_BINS, NUM_CHANNELS},
};

fn default_grid() -> Vec<f64> {
    linear_trial_grid(DEFAULT_DM_SEARCH_MIN, DEFAULT_DM_SEARCH_MAX, 51).unwrap()
}

#[test]
fn test_score_is_highest_when_aligned() {
    let portrait = get_dispersed_portrait(3e-3);
    let aligned = score(3e-3, &portrait);
    assert!(aligned > score(0.0, &portrait));
    assert!(aligned > score(2e-3, &portrait));
    assert!(aligned > score(4e-3, &portrait));
    assert!(aligned > score(-3e-3, &portrait));
}

#[test]
fn test_score_is_population_std_of_collapsed_profile() {
    // np.std([2, 4, 4, 4, 5, 5, 7, 9]) == 2.0
    let portrait = Portrait::new(
        array![[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]],
        array![600.0],
        array![1.0],
        1.0,
    )
    .unwrap();
    assert_abs_diff_eq!(score(0.0, &portrait), 2.0);

    // Channels are summed before the spread is measured.
    let portrait = Portrait::new(
        array![[1.0, 2.0, 1.0, 3.0], [1.0, 2.0, 1.0, 3.0]],
        array![700.0, 800.0],
        array![1.0, 1.0],
        1.0,
    )
    .unwrap();
    // np.std([2, 4, 2, 6]) == sqrt(2.75)
    assert_abs_diff_eq!(score(0.0, &portrait), 2.75f64.sqrt(), epsilon = 1e-12);

    let portrait = Portrait::new(
        Array2::from_elem((2, 8), 3.0),
        array![700.0, 800.0],
        array![1.0, 1.0],
        1.0,
    )
    .unwrap();
    assert_abs_diff_eq!(score(0.0, &portrait), 0.0);
}

#[test]
fn test_search_recovers_dm_on_grid() {
    let portrait = get_dispersed_portrait(2e-3);
    let grid = default_grid();
    let result = search(&portrait, &grid).unwrap();
    assert_eq!(result.best_index, 30);
    assert_abs_diff_eq!(result.best_delta_dm, 2e-3, epsilon = 1e-3);
    assert!(result.fit.is_concave());
    assert_eq!(result.scores.len(), grid.len());
    assert_eq!(result.trial_offsets, grid);
    assert_abs_diff_eq!(result.best_score(), score(grid[30], &portrait));
}

#[test]
fn test_search_recovers_dm_between_trials() {
    // Halfway between trials 30 and 31.
    let portrait = get_dispersed_portrait(2.2e-3);
    let result = search(&portrait, &default_grid()).unwrap();
    assert!(
        result.best_index == 30 || result.best_index == 31,
        "best index {}",
        result.best_index
    );
    assert_abs_diff_eq!(result.best_delta_dm, 2.2e-3, epsilon = 1e-3);
}

#[test]
fn test_search_negative_dm() {
    let portrait = get_dispersed_portrait(-4e-3);
    let result = search(&portrait, &default_grid()).unwrap();
    assert_abs_diff_eq!(result.best_delta_dm, -4e-3, epsilon = 1e-3);
}

#[test]
fn test_flat_portrait_is_degenerate() {
    let portrait = Portrait::new(
        Array2::from_elem((NUM_CHANNELS, NUM_BINS), 3.0),
        Array1::linspace(400.0, 800.0, NUM_CHANNELS),
        Array1::ones(NUM_CHANNELS),
        FOLD_PERIOD,
    )
    .unwrap();
    let result = search(&portrait, &default_grid());
    assert!(
        matches!(result, Err(DmSearchError::DegenerateFit(_))),
        "{result:?}"
    );
}

#[test]
fn test_optimum_at_grid_edge_is_out_of_range() {
    let portrait = get_dispersed_portrait(0.0);

    let grid = [0.0, 1e-3, 2e-3, 3e-3, 4e-3];
    let result = search(&portrait, &grid);
    assert!(
        matches!(
            result,
            Err(DmSearchError::OutOfRange {
                index: 0,
                num_trials: 5,
                ..
            })
        ),
        "{result:?}"
    );

    let grid = [-4e-3, -3e-3, -2e-3, -1e-3, 0.0];
    let result = search(&portrait, &grid);
    assert!(
        matches!(
            result,
            Err(DmSearchError::OutOfRange {
                index: 4,
                num_trials: 5,
                ..
            })
        ),
        "{result:?}"
    );

    // Index 3 of 5 is also too close to the edge; only index 2 is refinable.
    let grid = [-3e-3, -2e-3, -1e-3, 0.0, 1e-3];
    let result = search(&portrait, &grid);
    assert!(
        matches!(result, Err(DmSearchError::OutOfRange { index: 3, .. })),
        "{result:?}"
    );

    let grid = [-2e-3, -1e-3, 0.0, 1e-3, 2e-3];
    let result = search(&portrait, &grid).unwrap();
    assert_eq!(result.best_index, 2);
    assert_abs_diff_eq!(result.best_delta_dm, 0.0, epsilon = 1e-3);
}

#[test]
fn test_window_opening_upwards_is_degenerate() {
    // The best trial (index 3) sits next to a trough, so the parabola through
    // trials 1 to 4 has a minimum rather than a maximum.
    let trial_offsets = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let scores = [1.0, 2.9, 0.0, 3.0, 2.9, 1.0];
    let result = refine_best_trial(&trial_offsets, &scores, 1e-10);
    assert!(
        matches!(result, Err(DmSearchError::DegenerateFit(_))),
        "{result:?}"
    );

    // A peaked window refines to a vertex near the best trial.
    let scores = [1.0, 2.0, 2.9, 3.0, 2.5, 1.0];
    let (best_index, fit) = refine_best_trial(&trial_offsets, &scores, 1e-10).unwrap();
    assert_eq!(best_index, 3);
    assert!(fit.is_concave());
    assert!(fit.vertex() > 2.0 && fit.vertex() < 4.0, "{}", fit.vertex());
}

#[test]
fn test_invalid_trials() {
    let portrait = get_dispersed_portrait(0.0);

    let result = search(&portrait, &[-1e-3, 0.0, 1e-3, 2e-3]);
    assert!(matches!(result, Err(DmSearchError::TooFewTrials(4))));
    assert!(matches!(
        search(&portrait, &[]),
        Err(DmSearchError::TooFewTrials(0))
    ));

    let result = search(&portrait, &[-2e-3, -1e-3, 1e-3, 0.0, 2e-3]);
    assert!(matches!(
        result,
        Err(DmSearchError::UnsortedTrials { index: 3, .. })
    ));

    // Repeated offsets aren't strictly increasing.
    let result = search(&portrait, &[-2e-3, -1e-3, -1e-3, 0.0, 2e-3]);
    assert!(matches!(
        result,
        Err(DmSearchError::UnsortedTrials { index: 2, .. })
    ));

    let result = search(&portrait, &[-2e-3, -1e-3, f64::NAN, 0.0, 2e-3]);
    assert!(matches!(
        result,
        Err(DmSearchError::UnsortedTrials { index: 2, .. })
    ));
}

#[test]
fn test_first_maximum_wins_ties() {
    assert_eq!(first_max_index(&[1.0, 3.0, 2.0, 3.0, 0.0]), 1);
    assert_eq!(first_max_index(&[5.0, 5.0, 5.0]), 0);
    assert_eq!(first_max_index(&[0.0, 1.0, 2.0, 3.0]), 3);
    assert_eq!(first_max_index(&[7.0]), 0);
}

#[test]
fn test_linear_trial_grid() {
    let grid = linear_trial_grid(-1e-2, 1e-2, 50).unwrap();
    assert_eq!(grid.len(), 50);
    assert_abs_diff_eq!(grid[0], -1e-2);
    assert_abs_diff_eq!(grid[49], 1e-2);
    assert!(grid.windows(2).all(|w| w[1] > w[0]));

    assert!(matches!(
        linear_trial_grid(-1e-2, 1e-2, 4),
        Err(DmSearchError::TooFewTrials(4))
    ));
    assert!(matches!(
        linear_trial_grid(1e-2, -1e-2, 50),
        Err(DmSearchError::InvalidGrid(_))
    ));
    assert!(matches!(
        linear_trial_grid(0.0, 0.0, 50),
        Err(DmSearchError::InvalidGrid(_))
    ));
    assert!(matches!(
        linear_trial_grid(f64::NEG_INFINITY, 0.0, 50),
        Err(DmSearchError::InvalidGrid(_))
    ));
}

#[test]
fn test_result_serialises_curve() {
    let portrait = get_dispersed_portrait(2e-3);
    let result = search(&portrait, &default_grid()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["best_index"], 30);
    assert_eq!(json["scores"].as_array().unwrap().len(), 51);
    assert_eq!(json["trial_offsets"].as_array().unwrap().len(), 51);
    assert!(json.get("fit").is_none());
}
