//! Error types for chamberseg-core.

use thiserror::Error;

/// Result type alias for chamberseg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for chamberseg operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A hit references a layer the chamber does not have.
    #[error("hit {hit} references layer {layer}, chamber has layers 1..={layers}")]
    UnknownLayer { hit: usize, layer: u8, layers: u8 },

    /// The chamber has no layers to order hits by.
    #[error("chamber geometry has no layers")]
    EmptyChamber,
}

/// Configuration values rejected by [`crate::SegmentConfig::validate`].
///
/// The builder itself runs with any configuration; front ends check it
/// before a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Seeds on the same layer can never define a line.
    #[error("min_layers_apart must be at least 1")]
    ZeroLayerSeparation,

    /// A proximity or slope window is not strictly positive.
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveWindow { name: &'static str, value: f64 },

    /// A segment needs at least the two seed hits.
    #[error("min_hits_per_segment must be at least 2, got {0}")]
    TooFewHitsPerSegment(usize),
}
