//! Finalized segments and the segment-building trait.

use crate::config::SegmentConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::geometry::ChamberGeometry;
use crate::hit::{LayerId, RecHit, RecHitData};
use nalgebra::{Matrix4, Point3, Vector3};

/// A straight-line segment through a chamber.
///
/// Parameters are expressed in the chamber-local frame. The error matrix is
/// ordered `(slope_u, slope_v, position_u, position_v)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<H = RecHitData> {
    /// Hits on the segment, at most one per layer.
    pub hits: Vec<H>,
    /// Indices of [`Segment::hits`] in the caller's input slice.
    pub hit_indices: Vec<usize>,
    /// Point on the line at local depth zero.
    pub local_position: Point3<f64>,
    /// Unit direction, oriented away from the detector origin.
    pub local_direction: Vector3<f64>,
    /// 4x4 symmetric parameter covariance.
    pub errors: Matrix4<f64>,
    /// Chi-square of the fit.
    pub chi2: f64,
}

impl<H: RecHit> Segment<H> {
    /// Returns the number of hits on the segment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the segment carries no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns an iterator over the hits.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.hits.iter()
    }

    /// Layers crossed by the segment, in hit order.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerId> {
        self.hits.iter().map(RecHit::layer).collect()
    }

    /// Two measurements per hit minus four fitted parameters.
    #[must_use]
    pub fn degrees_of_freedom(&self) -> usize {
        (2 * self.hits.len()).saturating_sub(4)
    }

    /// Slopes `(du/dz, dv/dz)` implied by the direction.
    #[must_use]
    pub fn slopes(&self) -> Option<(f64, f64)> {
        let d = &self.local_direction;
        if d.z == 0.0 {
            return None;
        }
        Some((d.x / d.z, d.y / d.z))
    }
}

/// Trait for segment-building algorithms.
///
/// An algorithm owns only its configuration; everything mutable during a
/// search lives in [`SegmentAlgorithm::State`], so one algorithm value can
/// serve many chambers concurrently as long as each gets its own state.
pub trait SegmentAlgorithm: Send + Sync {
    /// Per-invocation working state.
    type State: Default + Send;

    /// Returns the name of the algorithm.
    fn name(&self) -> &'static str;

    /// Replaces the configuration.
    fn configure(&mut self, config: SegmentConfig);

    /// Current configuration.
    fn config(&self) -> &SegmentConfig;

    /// Creates a fresh working state.
    fn create_state(&self) -> Self::State {
        Self::State::default()
    }

    /// Builds segments from one chamber's hits.
    ///
    /// # Errors
    /// Fails only on hits referencing layers the chamber lacks. Any
    /// configuration is searched as given; numerical problems are reported
    /// through [`SegmentAlgorithm::diagnostics`].
    fn build<G, H>(&self, chamber: &G, hits: &[H], state: &mut Self::State) -> Result<Vec<Segment<H>>>
    where
        G: ChamberGeometry,
        H: RecHit + Clone;

    /// Diagnostics of the last [`SegmentAlgorithm::build`] call on `state`.
    fn diagnostics<'s>(&self, state: &'s Self::State) -> &'s Diagnostics;
}
