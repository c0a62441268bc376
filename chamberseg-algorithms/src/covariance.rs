//! Parameter covariance of a finalized segment.

use crate::chamber_hit::ChamberHit;
use crate::fit::design_rows;
use crate::linalg::record_degenerate;
use chamberseg_core::diagnostics::{Diagnostics, MatrixKind};
use nalgebra::{DMatrix, Matrix4};

/// Computes the 4x4 error matrix of a line through `hits`.
///
/// Stacks the per-hit design rows into `A` (2n x 4) and the raw position
/// covariances into a block-diagonal `V` (2n x 2n), then returns
/// `(A^T V^-1 A)^-1` reordered as `(slope_u, slope_v, pos_u, pos_v)`.
///
/// If `V` cannot be inverted the per-hit weights (zero for degenerate hits)
/// stand in for `V^-1`. If the information matrix is singular the result is
/// all zeros. Both cases are recorded in `diagnostics`.
pub fn segment_errors(hits: &[&ChamberHit], diagnostics: &mut Diagnostics) -> Matrix4<f64> {
    let rows = 2 * hits.len();
    let mut design = DMatrix::<f64>::zeros(rows, 4);
    let mut stacked = DMatrix::<f64>::zeros(rows, rows);

    for (i, hit) in hits.iter().enumerate() {
        let r = 2 * i;
        design
            .fixed_view_mut::<2, 4>(r, 0)
            .copy_from(&design_rows(hit.depth()));
        stacked
            .fixed_view_mut::<2, 2>(r, r)
            .copy_from(&hit.covariance);
    }

    let weights = stacked.try_inverse().unwrap_or_else(|| {
        record_degenerate(diagnostics, MatrixKind::StackedCovariance, None);
        let mut fallback = DMatrix::<f64>::zeros(rows, rows);
        for (i, hit) in hits.iter().enumerate() {
            fallback
                .fixed_view_mut::<2, 2>(2 * i, 2 * i)
                .copy_from(&hit.weight);
        }
        fallback
    });

    let information = design.transpose() * weights * &design;
    let information: Matrix4<f64> = information.fixed_view::<4, 4>(0, 0).into_owned();

    let Some(covariance) = information.try_inverse() else {
        record_degenerate(diagnostics, MatrixKind::SegmentInformation, None);
        return Matrix4::zeros();
    };

    slopes_first(&covariance)
}

/// Swaps the diagonal 2x2 blocks of a `(pos_u, pos_v, slope_u, slope_v)`
/// covariance so slopes come first. Off-diagonal blocks are left in place.
#[must_use]
pub fn slopes_first(cov: &Matrix4<f64>) -> Matrix4<f64> {
    let mut out = *cov;
    out.fixed_view_mut::<2, 2>(0, 0)
        .copy_from(&cov.fixed_view::<2, 2>(2, 2));
    out.fixed_view_mut::<2, 2>(2, 2)
        .copy_from(&cov.fixed_view::<2, 2>(0, 0));
    out
}
