//! Proto-segments: the working hypothesis grown from a seed pair.

use crate::chamber_hit::ChamberHit;
use crate::fit::{fit_line, LineParams};
use crate::linalg::record_degenerate;
use chamberseg_core::diagnostics::{Diagnostics, MatrixKind};
use chamberseg_core::hit::LayerId;

/// A candidate line and the hits currently assigned to it.
///
/// Hits are referenced by their position in the chamber's prepared hit
/// list. At most one hit per layer is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtoSegment {
    hits: Vec<usize>,
    line: LineParams,
    chi2: f64,
}

impl ProtoSegment {
    /// Starts a proto-segment from two seed hits and a provisional line.
    #[must_use]
    pub fn seeded(first: usize, second: usize, line: LineParams) -> Self {
        let mut hits = Vec::with_capacity(8);
        hits.push(first);
        hits.push(second);
        Self {
            hits,
            line,
            chi2: 0.0,
        }
    }

    /// Positions of the assigned hits in the prepared hit list.
    #[must_use]
    pub fn hits(&self) -> &[usize] {
        &self.hits
    }

    /// Number of assigned hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if no hit is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Current line estimate.
    #[must_use]
    pub fn line(&self) -> &LineParams {
        &self.line
    }

    /// Chi-square of the last fit.
    #[must_use]
    pub fn chi2(&self) -> f64 {
        self.chi2
    }

    /// Returns true if `hit` is already assigned.
    #[must_use]
    pub fn contains(&self, hit: usize) -> bool {
        self.hits.contains(&hit)
    }

    /// Returns true if a hit on `layer` is already assigned.
    #[must_use]
    pub fn has_hit_on_layer(&self, prepared: &[ChamberHit], layer: LayerId) -> bool {
        self.hits.iter().any(|&i| prepared[i].layer == layer)
    }

    /// Appends `hit`; returns false and leaves the segment unchanged if it is
    /// already assigned.
    pub fn add_hit(&mut self, hit: usize) -> bool {
        if self.contains(hit) {
            return false;
        }
        self.hits.push(hit);
        true
    }

    /// Drops every hit on `layer`.
    pub fn remove_layer(&mut self, prepared: &[ChamberHit], layer: LayerId) {
        self.hits.retain(|&i| prepared[i].layer != layer);
    }

    /// Refits the line to the assigned hits and updates chi-square.
    ///
    /// Singular normal equations keep the previous line; chi-square is still
    /// re-evaluated for the current hit set.
    pub fn refit(&mut self, prepared: &[ChamberHit], diagnostics: &mut Diagnostics) {
        let refs = self.hit_refs(prepared);
        let fit = fit_line(&refs, &self.line);
        if !fit.solved {
            record_degenerate(diagnostics, MatrixKind::NormalEquations, None);
        }
        self.line = fit.line;
        self.chi2 = fit.chi2;
    }

    /// The assigned hits, resolved against `prepared`.
    #[must_use]
    pub fn hit_refs<'a>(&self, prepared: &'a [ChamberHit]) -> Vec<&'a ChamberHit> {
        self.hits.iter().map(|&i| &prepared[i]).collect()
    }
}
