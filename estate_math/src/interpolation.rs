//! Linear interpolation helpers for gap filling and cadence resampling

use crate::{MathError, Result};

/// Linear blend between `from` and `to` at `weight` in `[0, 1]`
pub fn lerp(from: f64, to: f64, weight: f64) -> f64 {
    from + (to - from) * weight
}

/// Interpolation weight for the `index`-th (0-based) of `total` steps.
///
/// A single step has weight 0, so one observed week never divides by zero.
pub fn step_weight(index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 0.0;
    }
    index as f64 / (total - 1) as f64
}

/// Fill interior gaps of `ys` by linear interpolation over the positions `xs`.
///
/// Only gaps bracketed by known values are filled. Leading gaps and gaps after
/// the last known value stay `None`.
pub fn interpolate_interior(xs: &[f64], ys: &[Option<f64>]) -> Result<Vec<Option<f64>>> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "Position length ({}) doesn't match value length ({})",
            xs.len(),
            ys.len()
        )));
    }
    if xs.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(MathError::InvalidInput(
            "Positions must be strictly increasing".to_string(),
        ));
    }

    let mut filled = ys.to_vec();
    let mut previous: Option<usize> = None;

    for (i, value) in ys.iter().enumerate() {
        let Some(right) = value else { continue };

        if let Some(left_index) = previous {
            if i > left_index + 1 {
                if let Some(left) = ys[left_index] {
                    let span = xs[i] - xs[left_index];
                    for gap in left_index + 1..i {
                        let weight = (xs[gap] - xs[left_index]) / span;
                        filled[gap] = Some(lerp(left, *right, weight));
                    }
                }
            }
        }
        previous = Some(i);
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_step_weight() {
        assert_relative_eq!(step_weight(0, 1), 0.0);
        assert_relative_eq!(step_weight(0, 4), 0.0);
        assert_relative_eq!(step_weight(2, 5), 0.5);
        assert_relative_eq!(step_weight(3, 4), 1.0);
    }

    #[test]
    fn test_interpolate_interior_fills_bracketed_gaps() {
        let xs = [0.0, 7.0, 14.0, 21.0];
        let ys = [Some(100.0), None, None, Some(130.0)];

        let filled = interpolate_interior(&xs, &ys).unwrap();
        assert_relative_eq!(filled[1].unwrap(), 110.0, epsilon = 1e-9);
        assert_relative_eq!(filled[2].unwrap(), 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolate_interior_uses_positions() {
        let xs = [0.0, 1.0, 4.0];
        let ys = [Some(0.0), None, Some(8.0)];

        let filled = interpolate_interior(&xs, &ys).unwrap();
        assert_relative_eq!(filled[1].unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolate_interior_leaves_edges() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [None, Some(1.0), None, Some(3.0), None];

        let filled = interpolate_interior(&xs, &ys).unwrap();
        assert_eq!(filled[0], None);
        assert_relative_eq!(filled[2].unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(filled[4], None);
    }

    #[test]
    fn test_interpolate_interior_validates_positions() {
        assert!(interpolate_interior(&[0.0, 0.0], &[Some(1.0), None]).is_err());
        assert!(interpolate_interior(&[0.0], &[Some(1.0), None]).is_err());
    }
}
