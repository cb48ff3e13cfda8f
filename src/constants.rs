// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Frequencies are in MHz, times in
seconds and dispersion measures in pc cm^-3 unless stated otherwise.
 */

/// The dispersion constant \[s MHz^2 / (pc cm^-3)\]. This is the traditional
/// approximate value (4.15 x 10^6 ms MHz^2), not the SI-derived 4.148808 x
/// 10^3; the approximate value is what pulsar timing packages have used for
/// decades.
pub const DISPERSION_CONSTANT_S: f64 = 4.15e3;

/// The default lower edge of the DM-correction search grid \[pc cm^-3\].
pub const DEFAULT_DM_SEARCH_MIN: f64 = -1e-2;

/// The default upper edge of the DM-correction search grid \[pc cm^-3\].
pub const DEFAULT_DM_SEARCH_MAX: f64 = 1e-2;

/// The default number of trial DM corrections.
pub const DEFAULT_DM_SEARCH_NUM_TRIALS: usize = 50;

/// The minimum number of trial DM corrections; the parabolic refinement needs
/// two neighbours on each side of the best trial.
pub const MIN_DM_SEARCH_NUM_TRIALS: usize = 5;

/// If the spread of the scores in the refinement window is smaller than this
/// fraction of the collapsed profile's peak, the fit is degenerate.
pub const DEGENERATE_SCORE_TOLERANCE: f64 = 1e-10;

/// The default number of subbands used when aligning profiles.
pub const DEFAULT_NUM_SUBBANDS: usize = 8;

/// The default `psrsh` script used to convert and time-frequency zap CHIME
/// archives.
pub const DEFAULT_ZAP_SCRIPT: &str = "chime_convert_and_tfzap.psh";

/// The default command used to generate wideband TOAs. The placeholders are
/// substituted before the command is run.
pub const DEFAULT_TOA_COMMAND: &str =
    "pptoas.py -d {metafile} -m {template} -o {timfile} --DM0 {dm}";

/// The name of the execution summary written into the output directory.
pub const EXEC_SUMMARY_FILENAME: &str = "chime_pipeline_summary.json";
