//! Forecasting building blocks for saturating growth models
//!
//! Contains:
//! - Batch Linear Regression (ordinary least squares)
//! - Logistic (saturating) growth curve fitted in logit space
//! - Fourier seasonality terms
//! - Ridge-regularized least squares solver

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fraction of the cap kept clear on both ends when mapping into logit space
const LOGIT_MARGIN: f64 = 1e-6;

/// Linear Regression fitted over a batch of (x, y) pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    r_squared: Option<f64>,
}

impl LinearRegression {
    /// Fit `y = slope * x + intercept` by ordinary least squares
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(MathError::InvalidInput(format!(
                "x length ({}) doesn't match y length ({})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - (slope * x + intercept)).powi(2);
        }
        // A flat series has no variance to explain
        let r_squared = if ss_total.abs() < 1e-10 {
            None
        } else {
            Some(1.0 - ss_residual / ss_total)
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    /// Evaluate the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Get the fitted slope
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Get the fitted intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficient of determination, `None` for a constant target
    pub fn r_squared(&self) -> Option<f64> {
        self.r_squared
    }
}

/// Saturating growth curve `cap / (1 + exp(-(growth * t + offset)))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticCurve {
    cap: f64,
    growth: f64,
    offset: f64,
}

impl LogisticCurve {
    /// Create a curve from explicit parameters
    pub fn new(cap: f64, growth: f64, offset: f64) -> Result<Self> {
        if !(cap.is_finite() && cap > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Cap must be positive and finite, got {}",
                cap
            )));
        }

        Ok(Self {
            cap,
            growth,
            offset,
        })
    }

    /// Fit growth and offset for a fixed cap.
    ///
    /// Values are mapped into logit space and regressed on `ts`. Values outside
    /// the open interval `(0, cap)` are clamped just inside it.
    pub fn fit(ts: &[f64], ys: &[f64], cap: f64) -> Result<Self> {
        let curve = Self::new(cap, 0.0, 0.0)?;
        let lower = cap * LOGIT_MARGIN;
        let upper = cap * (1.0 - LOGIT_MARGIN);

        let zs = ys
            .iter()
            .map(|&y| {
                if !y.is_finite() {
                    return Err(MathError::InvalidInput(format!(
                        "Cannot fit logistic curve to non-finite value {}",
                        y
                    )));
                }
                curve.logit(y.clamp(lower, upper))
            })
            .collect::<Result<Vec<f64>>>()?;

        let line = LinearRegression::fit(ts, &zs)?;

        Ok(Self {
            cap,
            growth: line.slope(),
            offset: line.intercept(),
        })
    }

    /// Map a value in `(0, cap)` to logit space
    pub fn logit(&self, y: f64) -> Result<f64> {
        if y <= 0.0 || y >= self.cap {
            return Err(MathError::InvalidInput(format!(
                "Value {} is outside the open interval (0, {})",
                y, self.cap
            )));
        }

        Ok((y / (self.cap - y)).ln())
    }

    /// Evaluate the curve at `t`
    pub fn value(&self, t: f64) -> f64 {
        self.cap / (1.0 + (-(self.growth * t + self.offset)).exp())
    }

    /// Get the saturation cap
    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// Get the growth rate
    pub fn growth(&self) -> f64 {
        self.growth
    }

    /// Get the offset
    pub fn offset(&self) -> f64 {
        self.offset
    }
}

/// Fourier terms `[sin(2πnt/P), cos(2πnt/P)]` for `n = 1..=order`
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for n in 1..=order {
        let angle = 2.0 * PI * n as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}

/// Solve `min ||X b - y||² + lambda ||b||²` for `b`
pub fn solve_ridge(design: &[Vec<f64>], target: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design rows ({}) don't match target length ({})",
            design.len(),
            target.len()
        )));
    }
    if lambda < 0.0 {
        return Err(MathError::InvalidInput(
            "Ridge penalty cannot be negative".to_string(),
        ));
    }

    let columns = design.first().map(|row| row.len()).unwrap_or(0);
    if columns == 0 {
        return Ok(Vec::new());
    }
    if design.iter().any(|row| row.len() != columns) {
        return Err(MathError::InvalidInput(
            "Design rows must all have the same width".to_string(),
        ));
    }

    // Normal equations: (X'X + lambda I) b = X'y
    let mut gram = vec![vec![0.0; columns]; columns];
    let mut moment = vec![0.0; columns];
    for (row, &y) in design.iter().zip(target) {
        for i in 0..columns {
            moment[i] += row[i] * y;
            for j in 0..columns {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, gram_row) in gram.iter_mut().enumerate() {
        gram_row[i] += lambda;
    }

    solve_linear_system(gram, moment)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Singular system: cannot solve normal equations".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col].clone();
        let pivot_b = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * pivot[k];
            }
            b[row] -= factor * pivot_b;
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    Ok(solution)
}
