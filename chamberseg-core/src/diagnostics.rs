//! Side-channel record of what happened during one chamber's search.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which matrix could not be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatrixKind {
    /// A single hit's 2x2 position covariance.
    HitCovariance,
    /// The 4x4 normal-equation matrix of the line fit.
    NormalEquations,
    /// The stacked 2n x 2n covariance of a finalized segment.
    StackedCovariance,
    /// The 4x4 information matrix of a finalized segment.
    SegmentInformation,
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HitCovariance => "hit covariance",
            Self::NormalEquations => "normal equations",
            Self::StackedCovariance => "stacked covariance",
            Self::SegmentInformation => "segment information",
        };
        f.write_str(name)
    }
}

/// A non-invertible matrix met during the search.
///
/// The computation continued with the documented fallback for `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DegenerateMatrix {
    /// Matrix that failed to invert.
    pub kind: MatrixKind,
    /// Input index of the hit involved, for per-hit matrices.
    pub hit: Option<usize>,
}

/// Counters and degenerate-matrix events for one builder invocation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    /// Degenerate matrices, in the order they were met.
    pub degenerate: Vec<DegenerateMatrix>,
    /// Seed pairs considered (both hits unused).
    pub seed_pairs: usize,
    /// Pairs rejected for insufficient layer separation.
    pub rejected_separation: usize,
    /// Pairs rejected by the seed slope limits.
    pub rejected_slope: usize,
    /// Grown candidates discarded by the segment-size gate.
    pub candidates_too_small: usize,
    /// Same-layer replacements that lowered or kept chi-square.
    pub replacements_accepted: usize,
    /// Same-layer replacements rolled back.
    pub replacements_rejected: usize,
}

impl Diagnostics {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all events and counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a degenerate matrix.
    pub fn push_degenerate(&mut self, kind: MatrixKind, hit: Option<usize>) {
        self.degenerate.push(DegenerateMatrix { kind, hit });
    }

    /// Returns true if any matrix inversion fell back.
    #[must_use]
    pub fn has_degenerate(&self) -> bool {
        !self.degenerate.is_empty()
    }

    /// Number of degenerate events of a given kind.
    #[must_use]
    pub fn count_degenerate(&self, kind: MatrixKind) -> usize {
        self.degenerate.iter().filter(|d| d.kind == kind).count()
    }

    /// Folds another record into this one.
    pub fn merge(&mut self, other: &Diagnostics) {
        self.degenerate.extend_from_slice(&other.degenerate);
        self.seed_pairs += other.seed_pairs;
        self.rejected_separation += other.rejected_separation;
        self.rejected_slope += other.rejected_slope;
        self.candidates_too_small += other.candidates_too_small;
        self.replacements_accepted += other.replacements_accepted;
        self.replacements_rejected += other.replacements_rejected;
    }
}
