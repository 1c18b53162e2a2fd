use nalgebra::{DMatrix, DVector};

use crate::constants::SVD_EPSILON;

/// Least-squares polynomial fit of `ys` against `xs`.
///
/// Solves the Vandermonde system by singular value decomposition and returns
/// the coefficients highest power first, ready for [`polyval`]. Returns
/// `None` when fewer than `degree + 1` samples are supplied, the slices
/// disagree in length, or the system cannot be solved.
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    if xs.len() != ys.len() || xs.len() < degree + 1 {
        return None;
    }

    let vandermonde = DMatrix::from_fn(xs.len(), degree + 1, |row, col| {
        xs[row].powi((degree - col) as i32)
    });
    let rhs = DVector::from_column_slice(ys);

    let svd = vandermonde.svd(true, true);
    svd.solve(&rhs, SVD_EPSILON)
        .ok()
        .map(|coeffs| coeffs.as_slice().to_vec())
}

/// Evaluate a polynomial with coefficients ordered highest power first.
///
/// An empty coefficient slice evaluates to zero everywhere.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}
