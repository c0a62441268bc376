//! Hit traits and types for layered chamber measurements.

use nalgebra::{Matrix2, Point2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Layer number inside a chamber (1-based).
pub type LayerId = u8;

/// Symmetric 2x2 covariance of a hit's local position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalError {
    /// Variance along local u.
    pub xx: f64,
    /// Covariance between u and v.
    pub xy: f64,
    /// Variance along local v.
    pub yy: f64,
}

impl LocalError {
    /// Creates a covariance from its three independent entries.
    #[inline]
    #[must_use]
    pub fn new(xx: f64, xy: f64, yy: f64) -> Self {
        Self { xx, xy, yy }
    }

    /// Uncorrelated errors with standard deviations `sigma_u` and `sigma_v`.
    #[inline]
    #[must_use]
    pub fn uncorrelated(sigma_u: f64, sigma_v: f64) -> Self {
        Self::new(sigma_u * sigma_u, 0.0, sigma_v * sigma_v)
    }

    /// Full symmetric matrix.
    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> Matrix2<f64> {
        Matrix2::new(self.xx, self.xy, self.xy, self.yy)
    }

    /// Determinant of the covariance.
    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.xy
    }
}

/// Core data structure for a single reconstructed hit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecHitData {
    /// Layer the hit was measured on.
    pub layer: LayerId,
    /// Local u coordinate in the layer frame.
    pub x: f64,
    /// Local v coordinate in the layer frame.
    pub y: f64,
    /// Local position covariance.
    pub error: LocalError,
}

impl RecHitData {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(layer: LayerId, x: f64, y: f64, error: LocalError) -> Self {
        Self { layer, x, y, error }
    }
}

/// Trait for hits consumed by the segment builder.
///
/// Different front-ends (strip/wire combinations, simulated hits, ...)
/// expose their measurements through this uniform view.
pub trait RecHit: Send + Sync {
    /// Returns the layer the hit belongs to.
    fn layer(&self) -> LayerId;

    /// Returns the 2D position in the layer's local frame.
    fn local_position(&self) -> Point2<f64>;

    /// Returns the covariance of [`RecHit::local_position`].
    fn local_error(&self) -> LocalError;
}

impl RecHit for RecHitData {
    #[inline]
    fn layer(&self) -> LayerId {
        self.layer
    }

    #[inline]
    fn local_position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    #[inline]
    fn local_error(&self) -> LocalError {
        self.error
    }
}

impl<H: RecHit> RecHit for &H {
    #[inline]
    fn layer(&self) -> LayerId {
        (**self).layer()
    }

    #[inline]
    fn local_position(&self) -> Point2<f64> {
        (**self).local_position()
    }

    #[inline]
    fn local_error(&self) -> LocalError {
        (**self).local_error()
    }
}
