//! Straight-line calibration model: fit, predict, invert.
//!
//! The model is `response_ratio = slope * conc_ratio + intercept`. Fitting
//! happens in that direction (response regressed on concentration, matching
//! how the standards are prepared); quantification then uses the *inverse*
//! mapping, so the slope is checked against [`SLOPE_EPSILON`] before it is
//! ever used as a divisor.

use nalgebra::{DMatrix, DVector};

use crate::domain::FittedModel;
use crate::error::QuantError;
use crate::math::solve_least_squares;

/// Slopes with magnitude below this are treated as degenerate: the line is
/// flat and a response ratio carries no concentration information.
pub const SLOPE_EPSILON: f64 = 1e-12;

/// Fit a line through `(conc_ratio, response_ratio)` pairs.
///
/// Requires at least two distinct x values; a single calibration level
/// cannot define a line.
pub fn fit_line(pairs: &[(f64, f64)]) -> Result<FittedModel, QuantError> {
    let distinct = count_distinct_x(pairs);
    if distinct < 2 {
        return Err(QuantError::InsufficientData {
            distinct_points: distinct,
        });
    }

    let n = pairs.len();
    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut y = DVector::<f64>::zeros(n);
    for (i, &(cx, cy)) in pairs.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = cx;
        y[i] = cy;
    }

    let beta = solve_least_squares(&x, &y).ok_or(QuantError::DegenerateModel { slope: 0.0 })?;
    let intercept = beta[0];
    let slope = beta[1];

    Ok(FittedModel {
        slope,
        intercept,
        r_squared: r_squared(pairs, slope, intercept),
    })
}

/// Predicted response ratio at a concentration ratio.
pub fn predict(model: &FittedModel, x: f64) -> f64 {
    model.slope * x + model.intercept
}

/// Concentration ratio recovered from an observed response ratio.
///
/// Fails when the fitted slope is too close to zero to divide by.
pub fn invert(model: &FittedModel, y: f64) -> Result<f64, QuantError> {
    if model.slope.abs() < SLOPE_EPSILON {
        return Err(QuantError::DegenerateModel { slope: model.slope });
    }
    Ok((y - model.intercept) / model.slope)
}

fn count_distinct_x(pairs: &[(f64, f64)]) -> usize {
    let mut xs: Vec<f64> = pairs.iter().map(|&(x, _)| x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    xs.len()
}

/// Coefficient of determination between observed and predicted response
/// ratios, rounded to 4 decimals.
fn r_squared(pairs: &[(f64, f64)], slope: f64, intercept: f64) -> f64 {
    let n = pairs.len() as f64;
    let y_mean = pairs.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for &(x, y) in pairs {
        let y_fit = slope * x + intercept;
        ss_res += (y - y_fit) * (y - y_fit);
        ss_tot += (y - y_mean) * (y - y_mean);
    }

    // All-equal observed values leave the total sum of squares at zero; the
    // line either reproduces them exactly or explains nothing.
    let r2 = if ss_tot <= f64::EPSILON {
        if ss_res <= f64::EPSILON { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    };

    (r2.clamp(0.0, 1.0) * 1e4).round() / 1e4
}
