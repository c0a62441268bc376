//! chamberseg-algorithms: Straight-line segment finding in layered chambers.
//!
//! This crate provides the pieces of the DF segment builder:
//! - **Proximity test** - azimuthal window between a hit and a line
//! - **Weighted fitter** - covariance-weighted least squares for `u(z)`, `v(z)`
//! - **Error propagation** - 4x4 parameter covariance of a finished segment
//! - **Conflict resolution** - chi-square arbitration between same-layer hits
//! - **Builder** - the seed / grow / finalize search over a chamber
//!
#![warn(missing_docs)]

mod builder;
pub mod chamber_hit;
mod conflict;
pub mod covariance;
pub mod fit;
pub mod linalg;
mod processing;
mod proto;
pub mod proximity;

#[cfg(test)]
mod test_support;

pub use builder::{DfSegmentBuilder, DfState, MAX_SEGMENTS_PER_CHAMBER, MIN_HITS_IN_CHAMBER};
pub use chamber_hit::ChamberHit;
pub use conflict::{resolve_conflict, Resolution};
pub use fit::{LineFit, LineParams};
pub use processing::{build_segments, build_segments_batch, ChamberSegments};
pub use proto::ProtoSegment;
pub use proximity::ProximityWindow;

// Re-export core segment types
pub use chamberseg_core::{SegmentAlgorithm, SegmentConfig};
