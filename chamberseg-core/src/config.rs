//! Segment-building configuration.

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the second point of a seed pair is obtained when computing the
/// provisional seed slopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SeedProjection {
    /// Reference behavior: the first hit's local position is placed on the
    /// second hit's layer. Slopes then only reflect the relative alignment
    /// of the two layers.
    #[default]
    FirstHit,
    /// The second hit's own position is used.
    SecondHit,
}

/// Configuration for the segment builder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmentConfig {
    /// Minimum layer separation between the two seed hits.
    pub min_layers_apart: u8,
    /// Tolerance in standard deviations. Carried for configuration
    /// compatibility; the proximity test does not use it.
    pub n_sigma_from_segment: f64,
    /// Base minimum number of hits for a segment to be kept.
    pub min_hits_per_segment: usize,
    /// Maximum arc-length deviation `R * dphi` between hit and line.
    pub d_rphi_fine_max: f64,
    /// Maximum azimuthal deviation between hit and line (radians).
    pub d_phi_fine_max: f64,
    /// Maximum |v-slope| of a seed pair.
    pub tan_theta_max: f64,
    /// Maximum |u-slope| of a seed pair.
    pub tan_phi_max: f64,
    /// Emit per-candidate diagnostics through the logger.
    pub debug: bool,
    /// Second-point convention for seed slopes.
    pub seed_projection: SeedProjection,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_layers_apart: 2,
            n_sigma_from_segment: 5.0,
            min_hits_per_segment: 3,
            d_rphi_fine_max: 8.0,
            d_phi_fine_max: 0.025,
            tan_theta_max: 1.2,
            tan_phi_max: 0.5,
            debug: false,
            seed_projection: SeedProjection::FirstHit,
        }
    }
}

impl SegmentConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum seed layer separation.
    #[must_use]
    pub fn with_min_layers_apart(mut self, layers: u8) -> Self {
        self.min_layers_apart = layers;
        self
    }

    /// Sets the base minimum hit count.
    #[must_use]
    pub fn with_min_hits_per_segment(mut self, hits: usize) -> Self {
        self.min_hits_per_segment = hits;
        self
    }

    /// Sets both proximity windows.
    #[must_use]
    pub fn with_proximity(mut self, d_rphi_max: f64, d_phi_max: f64) -> Self {
        self.d_rphi_fine_max = d_rphi_max;
        self.d_phi_fine_max = d_phi_max;
        self
    }

    /// Sets the seed slope limits.
    #[must_use]
    pub fn with_slope_limits(mut self, tan_theta_max: f64, tan_phi_max: f64) -> Self {
        self.tan_theta_max = tan_theta_max;
        self.tan_phi_max = tan_phi_max;
        self
    }

    /// Sets the sigma tolerance.
    #[must_use]
    pub fn with_n_sigma_from_segment(mut self, n_sigma: f64) -> Self {
        self.n_sigma_from_segment = n_sigma;
        self
    }

    /// Enables or disables debug diagnostics.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Selects the seed-slope convention.
    #[must_use]
    pub fn with_seed_projection(mut self, projection: SeedProjection) -> Self {
        self.seed_projection = projection;
        self
    }

    /// Checks that the configuration can drive a search.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a zero layer separation, a minimum hit
    /// count below two, or a window that is not strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_layers_apart == 0 {
            return Err(ConfigError::ZeroLayerSeparation);
        }
        if self.min_hits_per_segment < 2 {
            return Err(ConfigError::TooFewHitsPerSegment(self.min_hits_per_segment));
        }
        let windows = [
            ("d_rphi_fine_max", self.d_rphi_fine_max),
            ("d_phi_fine_max", self.d_phi_fine_max),
            ("tan_theta_max", self.tan_theta_max),
            ("tan_phi_max", self.tan_phi_max),
        ];
        for (name, value) in windows {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveWindow { name, value });
            }
        }
        Ok(())
    }
}
