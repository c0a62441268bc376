//! Hit fixtures shared by unit tests.

use crate::chamber_hit::ChamberHit;
use crate::fit::LineParams;
use nalgebra::{Matrix2, Point2, Point3};

/// Layer depths of a six-layer chamber with pitch 2.
pub(crate) const DEPTHS: [(u8, f64); 6] = [(1, -5.0), (2, -3.0), (3, -1.0), (4, 1.0), (5, 3.0), (6, 5.0)];

/// A hit whose chamber frame coincides with the global frame.
pub(crate) fn hit_at(layer: u8, u: f64, v: f64, z: f64, sigma: f64) -> ChamberHit {
    let cov = Matrix2::new(sigma * sigma, 0.0, 0.0, sigma * sigma);
    ChamberHit {
        input_index: usize::from(layer),
        layer,
        local: Point2::new(u, v),
        global: Point3::new(u, v, z),
        chamber: Point3::new(u, v, z),
        covariance: cov,
        weight: cov.try_inverse().unwrap_or_else(Matrix2::zeros),
    }
}

/// One hit per layer, exactly on `line`.
pub(crate) fn on_line(line: &LineParams, sigma: f64) -> Vec<ChamberHit> {
    DEPTHS
        .iter()
        .map(|&(layer, z)| {
            let p = line.at(z);
            hit_at(layer, p.x, p.y, z, sigma)
        })
        .collect()
}
