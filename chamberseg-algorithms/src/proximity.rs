//! Azimuthal proximity between a hit and a candidate line.

use crate::chamber_hit::ChamberHit;
use crate::fit::LineParams;
use chamberseg_core::config::SegmentConfig;
use chamberseg_core::geometry::ChamberGeometry;
use log::trace;
use nalgebra::Point3;
use std::f64::consts::TAU;

/// Acceptance window of the proximity test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximityWindow {
    /// Maximum `R * |dphi|`.
    pub d_rphi_max: f64,
    /// Maximum `|dphi|` in radians.
    pub d_phi_max: f64,
}

impl From<&SegmentConfig> for ProximityWindow {
    fn from(config: &SegmentConfig) -> Self {
        Self {
            d_rphi_max: config.d_rphi_fine_max,
            d_phi_max: config.d_phi_fine_max,
        }
    }
}

/// Azimuth of a global point in `[0, 2pi)`.
#[inline]
#[must_use]
pub fn azimuth(p: &Point3<f64>) -> f64 {
    let phi = p.y.atan2(p.x);
    if phi < 0.0 {
        phi + TAU
    } else {
        phi
    }
}

/// Absolute difference of two azimuths taken in `[0, 2pi)`.
///
/// The raw difference is folded into `[-2pi, 2pi]` before the absolute
/// value is taken; no wrap to the short way round is applied.
#[inline]
#[must_use]
pub fn delta_phi(phi_line: f64, phi_hit: f64) -> f64 {
    let mut d = phi_line - phi_hit;
    if d > TAU {
        d -= TAU;
    }
    if d < -TAU {
        d += TAU;
    }
    d.abs()
}

/// Returns true if `hit` is azimuthally consistent with `line`.
///
/// The line is evaluated at the hit's depth, both points are taken to the
/// global frame and compared in azimuth. Accepts when `R * dphi` and `dphi`
/// are both strictly inside `window`, `R` being the transverse radius of
/// the predicted point.
pub fn is_hit_near_line<G: ChamberGeometry>(
    chamber: &G,
    line: &LineParams,
    hit: &ChamberHit,
    window: &ProximityWindow,
) -> bool {
    let phi_hit = azimuth(&hit.global);

    let predicted = chamber.to_global(&line.at(hit.depth()));
    let phi_line = azimuth(&predicted);
    let radius = predicted.x.hypot(predicted.y);

    let dphi = delta_phi(phi_line, phi_hit);
    let rdphi = radius * dphi;
    let near = rdphi < window.d_rphi_max && dphi < window.d_phi_max;
    trace!(
        "hit {} layer {}: dphi={dphi:.5} R*dphi={rdphi:.4} near={near}",
        hit.input_index,
        hit.layer
    );
    near
}
