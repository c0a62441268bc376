//! Hits expressed in every frame the search needs.
//!
//! Transforms and covariance inversions are done once per invocation; the
//! proximity test, fitter and error propagation then work on cached values.

use crate::linalg::{invert_covariance, record_degenerate, zero_information};
use chamberseg_core::diagnostics::{Diagnostics, MatrixKind};
use chamberseg_core::error::{Error, Result};
use chamberseg_core::geometry::ChamberGeometry;
use chamberseg_core::hit::{LayerId, RecHit};
use nalgebra::{Matrix2, Point2, Point3};

/// A hit resolved against its chamber.
#[derive(Clone, Debug, PartialEq)]
pub struct ChamberHit {
    /// Index of the hit in the caller's input slice.
    pub input_index: usize,
    /// Layer the hit sits on.
    pub layer: LayerId,
    /// Position in the layer's local plane.
    pub local: Point2<f64>,
    /// Global position.
    pub global: Point3<f64>,
    /// Chamber-local position; `z` is the layer depth.
    pub chamber: Point3<f64>,
    /// Raw local position covariance.
    pub covariance: Matrix2<f64>,
    /// Inverse of `covariance`, or zero if it was not invertible.
    pub weight: Matrix2<f64>,
}

impl ChamberHit {
    /// Resolves `hit` against `chamber`.
    ///
    /// A singular covariance is recorded in `diagnostics` and replaced by a
    /// zero weight (the hit then carries no information in fits).
    ///
    /// # Errors
    /// Returns [`Error::UnknownLayer`] if the chamber lacks the hit's layer.
    pub fn prepare<G, H>(
        chamber: &G,
        input_index: usize,
        hit: &H,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self>
    where
        G: ChamberGeometry,
        H: RecHit,
    {
        let layer = hit.layer();
        let local = hit.local_position();
        let global = chamber
            .layer_to_global(layer, &local)
            .ok_or_else(|| Error::UnknownLayer {
                hit: input_index,
                layer,
                layers: chamber.num_layers(),
            })?;
        let covariance = hit.local_error().to_matrix();
        let weight = invert_covariance(&covariance).unwrap_or_else(|| {
            record_degenerate(diagnostics, MatrixKind::HitCovariance, Some(input_index));
            zero_information()
        });

        Ok(Self {
            input_index,
            layer,
            local,
            global,
            chamber: chamber.to_local(&global),
            covariance,
            weight,
        })
    }

    /// Chamber-local depth of the hit.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.chamber.z
    }
}

/// Returns true when the stored hit order must be reversed so that layer
/// numbering runs with increasing depth away from the detector origin.
///
/// The decision looks at the global z of the first and last layers.
///
/// # Errors
/// Returns [`Error::EmptyChamber`] if the chamber has no layers.
pub fn needs_reversal<G: ChamberGeometry>(chamber: &G) -> Result<bool> {
    let last = chamber.num_layers();
    let first_z = chamber.layer_position(1).ok_or(Error::EmptyChamber)?.z;
    let last_z = chamber.layer_position(last).ok_or(Error::EmptyChamber)?.z;

    Ok((first_z > 0.0 && first_z > last_z) || (first_z < 0.0 && first_z < last_z))
}

/// Resolves all hits of a chamber, in search order.
///
/// # Errors
/// Propagates [`Error::UnknownLayer`] and [`Error::EmptyChamber`].
pub fn prepare_hits<G, H>(
    chamber: &G,
    hits: &[H],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ChamberHit>>
where
    G: ChamberGeometry,
    H: RecHit,
{
    let reverse = needs_reversal(chamber)?;
    let mut prepared = hits
        .iter()
        .enumerate()
        .map(|(idx, hit)| ChamberHit::prepare(chamber, idx, hit, diagnostics))
        .collect::<Result<Vec<_>>>()?;
    if reverse {
        prepared.reverse();
    }
    Ok(prepared)
}
