// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Plots of DM search curves, aligned subband profiles and portraits.


use std::path::Path;

use log::debug;
use ndarray::prelude::*;
use plotters::{prelude::*, style::RGBAColor};
use thiserror::Error;

use crate::dm_search::DmSearchResult;

/// The number of X pixels on the plots.
const X_PIXELS: u32 = 1600;
/// The number of Y pixels on the plots.
const Y_PIXELS: u32 = 1200;

lazy_static::lazy_static! {
    static ref FIT_COLOUR: RGBAColor = RED.mix(0.8);
}

/// Plot the score of every trial DM offset, the parabola fitted around the
/// best trial and the refined DM correction.
pub(crate) fn plot_dm_curve(result: &DmSearchResult, file: &Path) -> Result<(), DrawError> {
    debug!("Plotting the DM search curve to {}", file.display());
    let (x_min, x_max) = min_max(&result.trial_offsets);
    let (y_min, y_max) = padded(min_max(&result.scores));

    let root_area = BitMapBackend::new(file, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root_area
        .fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let mut cc = ChartBuilder::on(&root_area)
        .caption(
            format!("Best dDM = {:.6e} pc/cm^3", result.best_delta_dm),
            ("sans-serif", 40),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| DrawError::DmCurve(e.to_string()))?;
    cc.configure_mesh()
        .x_desc("dDM (pc/cm^3)")
        .y_desc("Score")
        .x_label_formatter(&|x| format!("{x:.1e}"))
        .draw()
        .map_err(|e| DrawError::DmCurve(e.to_string()))?;

    cc.draw_series(PointSeries::of_element(
        result
            .trial_offsets
            .iter()
            .copied()
            .zip(result.scores.iter().copied()),
        4,
        ShapeStyle::from(&BLUE).filled(),
        &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
    ))
    .map_err(|e| DrawError::DmCurve(e.to_string()))?;

    // The fit only describes the refinement window.
    let j = result.best_index;
    let (fit_min, fit_max) = (result.trial_offsets[j - 2], result.trial_offsets[j + 1]);
    let num_points = 100;
    cc.draw_series(LineSeries::new(
        (0..=num_points).map(|i| {
            let x = fit_min + (fit_max - fit_min) * i as f64 / num_points as f64;
            (x, result.fit.eval(x))
        }),
        FIT_COLOUR.stroke_width(2),
    ))
    .map_err(|e| DrawError::DmCurve(e.to_string()))?;

    cc.draw_series(LineSeries::new(
        [
            (result.best_delta_dm, y_min),
            (result.best_delta_dm, y_max),
        ],
        BLACK.stroke_width(1),
    ))
    .map_err(|e| DrawError::DmCurve(e.to_string()))?;

    root_area
        .present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Plot subband profiles against phase, each offset vertically by its index
/// so that misalignment is easy to see.
pub(crate) fn plot_aligned_profiles(
    profiles: &[Array1<f64>],
    phases: ArrayView1<f64>,
    frequencies: &[f64],
    delta_dm: f64,
    file: &Path,
) -> Result<(), DrawError> {
    debug!(
        "Plotting {} aligned profiles to {}",
        profiles.len(),
        file.display()
    );
    if profiles.is_empty()
        || phases.is_empty()
        || profiles.iter().any(|p| p.len() != phases.len())
    {
        return Err(DrawError::NoData);
    }
    let (p_min, p_max) = profiles
        .iter()
        .flat_map(|p| p.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if p_max > p_min { p_max - p_min } else { 1.0 };

    let root_area = BitMapBackend::new(file, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root_area
        .fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let mut cc = ChartBuilder::on(&root_area)
        .caption(
            format!("Subbands aligned at dDM = {delta_dm} pc/cm^3"),
            ("sans-serif", 40),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..1.0, -0.5..profiles.len() as f64 + 0.5)
        .map_err(|e| DrawError::Profiles(e.to_string()))?;
    cc.configure_mesh()
        .x_desc("Phase")
        .y_desc("Subband")
        .disable_y_mesh()
        .draw()
        .map_err(|e| DrawError::Profiles(e.to_string()))?;

    for (i, (profile, &freq)) in profiles.iter().zip(frequencies).enumerate() {
        let colour = Palette99::pick(i).to_rgba();
        cc.draw_series(LineSeries::new(
            phases
                .iter()
                .zip(profile.iter())
                .map(|(&phase, &v)| (phase, i as f64 + (v - p_min) / span)),
            colour.stroke_width(2),
        ))
        .map_err(|e| DrawError::Profiles(e.to_string()))?
        .label(format!("{freq:.2} MHz"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(2)));
    }
    cc.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| DrawError::Profiles(e.to_string()))?;

    root_area
        .present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Plot a (dedispersed) portrait as a phase-frequency image.
pub(crate) fn plot_portrait(
    channel_rows: ArrayView2<f64>,
    frequencies: ArrayView1<f64>,
    title: &str,
    file: &Path,
) -> Result<(), DrawError> {
    debug!("Plotting a portrait to {}", file.display());
    let (num_chans, num_bins) = channel_rows.dim();
    if num_chans == 0 || num_bins == 0 || frequencies.len() != num_chans {
        return Err(DrawError::NoData);
    }
    let (f_min, f_max) = min_max(frequencies.as_slice().unwrap_or(&frequencies.to_vec()));
    let half_chan = if num_chans > 1 {
        (f_max - f_min) / (num_chans - 1) as f64 / 2.0
    } else {
        0.5
    };
    let (i_min, i_max) = channel_rows
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let i_span = if i_max > i_min { i_max - i_min } else { 1.0 };

    let root_area = BitMapBackend::new(file, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root_area
        .fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let mut cc = ChartBuilder::on(&root_area)
        .caption(title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(0.0..1.0, f_min - half_chan..f_max + half_chan)
        .map_err(|e| DrawError::Portrait(e.to_string()))?;
    cc.configure_mesh()
        .x_desc("Phase")
        .y_desc("Frequency (MHz)")
        .disable_mesh()
        .draw()
        .map_err(|e| DrawError::Portrait(e.to_string()))?;

    let bin_width = 1.0 / num_bins as f64;
    cc.draw_series(
        channel_rows
            .outer_iter()
            .zip(frequencies.iter())
            .flat_map(|(row, &freq)| {
                row.into_iter()
                    .enumerate()
                    .map(move |(bin, &v)| {
                        let x = bin as f64 * bin_width;
                        Rectangle::new(
                            [(x, freq - half_chan), (x + bin_width, freq + half_chan)],
                            intensity_colour((v - i_min) / i_span).filled(),
                        )
                    })
                    .collect::<Vec<_>>()
            }),
    )
    .map_err(|e| DrawError::Portrait(e.to_string()))?;

    root_area
        .present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Map a value in [0, 1] to a dark-blue to yellow colour.
fn intensity_colour(v: f64) -> RGBColor {
    let v = v.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + (b - a) * v).round() as u8;
    RGBColor(lerp(20.0, 250.0), lerp(20.0, 230.0), lerp(90.0, 30.0))
}

/// The range of the finite values; (0, 1) if there are none.
fn min_max(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() && hi.is_finite() && hi > lo {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 0.5, lo + 0.5)
    } else {
        (0.0, 1.0)
    }
}

fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("There was nothing to plot")]
    NoData,

    #[error("While plotting the DM curve: {0}")]
    DmCurve(String),

    #[error("While plotting profiles: {0}")]
    Profiles(String),

    #[error("While plotting the portrait: {0}")]
    Portrait(String),

    #[error("Error from the plotters library: {0}")]
    Plotters(Box<dyn std::error::Error>),
}
