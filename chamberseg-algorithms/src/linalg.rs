//! Small-matrix helpers shared by the fitter and the error propagation.

use chamberseg_core::diagnostics::{Diagnostics, MatrixKind};
use log::debug;
use nalgebra::Matrix2;

/// Inverts a 2x2 position covariance.
///
/// Returns `None` when the matrix is singular or carries non-finite
/// entries; callers substitute [`zero_information`].
#[must_use]
pub fn invert_covariance(cov: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let det = cov.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    cov.try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
}

/// Weight matrix of a measurement that carries no information.
#[inline]
#[must_use]
pub fn zero_information() -> Matrix2<f64> {
    Matrix2::zeros()
}

/// Logs a fallen-back inversion and appends it to `diagnostics`.
pub(crate) fn record_degenerate(
    diagnostics: &mut Diagnostics,
    kind: MatrixKind,
    hit: Option<usize>,
) {
    match hit {
        Some(idx) => debug!("failed to invert {kind} of hit {idx}, using fallback"),
        None => debug!("failed to invert {kind}, using fallback"),
    }
    diagnostics.push_degenerate(kind, hit);
}
