//! chamberseg-core: Core traits and types for chamber segment reconstruction.
//!
//! This crate provides the foundational abstractions shared by the segment
//! builder: hits and their covariances, chamber geometry, configuration,
//! finalized segments and the diagnostics record.
//!

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod hit;
pub mod segment;

pub use config::{SeedProjection, SegmentConfig};
pub use diagnostics::{DegenerateMatrix, Diagnostics, MatrixKind};
pub use error::{ConfigError, Error, Result};
pub use geometry::{ChamberGeometry, PlanarChamber};
pub use hit::{LayerId, LocalError, RecHit, RecHitData};
pub use segment::{Segment, SegmentAlgorithm};
