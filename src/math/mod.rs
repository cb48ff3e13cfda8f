// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.


use thiserror::Error;

/// `num` evenly-spaced values over `[start, stop]`; both ends are included.
/// One value yields `[start]`, zero values yield nothing.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        stop
                    } else {
                        start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}

/// The coefficients of y = ax^2 + bx + c.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticFit {
    /// The x-coordinate of the turning point, -b / 2a.
    pub fn vertex(&self) -> f64 {
        -self.b / (2.0 * self.a)
    }

    /// Is the parabola opening downwards (i.e. the vertex is a maximum)?
    pub fn is_concave(&self) -> bool {
        self.a < 0.0
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum QuadraticFitError {
    #[error("A quadratic fit needs at least 3 points, but {0} were supplied")]
    TooFewPoints(usize),

    #[error("The number of x values ({xs}) doesn't match the number of y values ({ys})")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("The normal equations of the quadratic fit are singular")]
    Singular,

    #[error("The fitted quadratic coefficient is zero or not finite (a = {0})")]
    Degenerate(f64),
}

/// Fit y = ax^2 + bx + c to the supplied points with least squares.
///
/// The x values are shifted to the middle point and scaled by the largest
/// offset before forming the normal equations, which are then solved with
/// Cramer's rule. Grids of DM trials are ~1e-3 wide, so fitting in raw units
/// would square and quarter-power tiny numbers.
pub fn fit_quadratic(xs: &[f64], ys: &[f64]) -> Result<QuadraticFit, QuadraticFitError> {
    if xs.len() != ys.len() {
        return Err(QuadraticFitError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    let n = xs.len();
    if n < 3 {
        return Err(QuadraticFitError::TooFewPoints(n));
    }

    let x_centre = xs[n / 2];
    let x_scale = xs
        .iter()
        .map(|&x| (x - x_centre).abs())
        .fold(0.0, f64::max);
    if x_scale == 0.0 || !x_scale.is_finite() {
        return Err(QuadraticFitError::Singular);
    }

    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        let u = (x - x_centre) / x_scale;
        let u2 = u * u;
        s1 += u;
        s2 += u2;
        s3 += u2 * u;
        s4 += u2 * u2;
        t0 += y;
        t1 += u * y;
        t2 += u2 * y;
    }
    let s0 = n as f64;

    // s0*c + s1*b + s2*a = t0
    // s1*c + s2*b + s3*a = t1
    // s2*c + s3*b + s4*a = t2
    let d = s0 * (s2 * s4 - s3 * s3) - s1 * (s1 * s4 - s2 * s3) + s2 * (s1 * s3 - s2 * s2);
    // The scaled coordinates lie in [-1, 1], so an absolute threshold is
    // meaningful here.
    if d.abs() < 1e-12 {
        return Err(QuadraticFitError::Singular);
    }

    let c_num = t0 * (s2 * s4 - s3 * s3) - s1 * (t1 * s4 - t2 * s3) + s2 * (t1 * s3 - t2 * s2);
    let b_num = s0 * (t1 * s4 - t2 * s3) - t0 * (s1 * s4 - s2 * s3) + s2 * (s1 * t2 - s2 * t1);
    let a_num = s0 * (s2 * t2 - s3 * t1) - s1 * (s1 * t2 - s2 * t1) + t0 * (s1 * s3 - s2 * s2);
    let (a_u, b_u, c_u) = (a_num / d, b_num / d, c_num / d);

    // Scale of the data; the quadratic term is negligible if it's this small
    // relative to the values being fitted.
    let y_scale = ys.iter().map(|y| y.abs()).fold(0.0, f64::max);
    if !a_u.is_finite() || a_u.abs() <= f64::EPSILON * y_scale || a_u == 0.0 {
        return Err(QuadraticFitError::Degenerate(a_u));
    }

    // Undo the change of variable u = (x - x0) / s.
    let inv_s = 1.0 / x_scale;
    let a = a_u * inv_s * inv_s;
    let b = b_u * inv_s - 2.0 * a * x_centre;
    let c = c_u - b_u * x_centre * inv_s + a_u * x_centre * x_centre * inv_s * inv_s;

    Ok(QuadraticFit { a, b, c })
}
