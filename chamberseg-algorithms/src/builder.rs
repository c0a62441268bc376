//! DF segment builder.
//!
//! Seeds straight-line candidates from pairs of hits on well separated
//! layers, grows them with every unused hit that passes the azimuthal
//! proximity test, resolves same-layer conflicts by chi-square and keeps
//! candidates that collect enough hits. Hits of a kept segment (and the
//! hits that competed for its layers) are flagged used: they start no new
//! seed pair and join no later candidate. The first seed in hand keeps
//! pairing with the remaining second seeds, so it may open several segments.

use crate::chamber_hit::{prepare_hits, ChamberHit};
use crate::conflict::{resolve_conflict, Resolution};
use crate::covariance::segment_errors;
use crate::fit::LineParams;
use crate::proto::ProtoSegment;
use crate::proximity::{is_hit_near_line, ProximityWindow};
use chamberseg_core::config::{SeedProjection, SegmentConfig};
use chamberseg_core::diagnostics::Diagnostics;
use chamberseg_core::error::Result;
use chamberseg_core::geometry::ChamberGeometry;
use chamberseg_core::hit::RecHit;
use chamberseg_core::segment::{Segment, SegmentAlgorithm};
use log::debug;
use nalgebra::Point3;

/// Maximum number of segments returned for one chamber.
pub const MAX_SEGMENTS_PER_CHAMBER: usize = 5;

/// Chambers with fewer hits produce no segments. Also the smallest number
/// of unused hits worth another search after a segment is emitted.
pub const MIN_HITS_IN_CHAMBER: usize = 3;

/// Occupancy above which one extra hit is required per segment.
const BUSY_CHAMBER_HITS: usize = 20;

/// Occupancy above which a second extra hit is required per segment.
const VERY_BUSY_CHAMBER_HITS: usize = 30;

/// Working state of one [`DfSegmentBuilder::build`] call.
///
/// Reused across calls to keep allocations; every call starts from a
/// reset state.
#[derive(Debug, Default)]
pub struct DfState {
    hits: Vec<ChamberHit>,
    used: Vec<bool>,
    close_hits: Vec<usize>,
    diagnostics: Diagnostics,
}

impl DfState {
    /// Clears all per-invocation data.
    pub fn reset(&mut self) {
        self.hits.clear();
        self.used.clear();
        self.close_hits.clear();
        self.diagnostics.reset();
    }

    /// Diagnostics of the last build.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Takes the diagnostics of the last build, leaving an empty record.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Input indices of the hits flagged as used by the last build.
    #[must_use]
    pub fn used_hits(&self) -> Vec<usize> {
        let mut used: Vec<usize> = self
            .hits
            .iter()
            .zip(&self.used)
            .filter(|(_, used)| **used)
            .map(|(hit, _)| hit.input_index)
            .collect();
        used.sort_unstable();
        used
    }
}

/// The DF straight-line segment builder.
#[derive(Debug, Clone, Default)]
pub struct DfSegmentBuilder {
    config: SegmentConfig,
}

impl DfSegmentBuilder {
    /// Creates a builder with the given configuration.
    #[must_use]
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    /// Minimum segment size for a chamber holding `hits_in_chamber` hits.
    #[must_use]
    pub fn required_hits(&self, hits_in_chamber: usize) -> usize {
        let mut bonus = 0;
        if hits_in_chamber > BUSY_CHAMBER_HITS {
            bonus += 1;
        }
        if hits_in_chamber > VERY_BUSY_CHAMBER_HITS {
            bonus += 1;
        }
        self.config.min_hits_per_segment + bonus
    }

    /// Provisional line through a seed pair, before slope cuts.
    ///
    /// Returns `None` when the pair has no depth separation.
    fn seed_line<G: ChamberGeometry>(
        &self,
        chamber: &G,
        first: &ChamberHit,
        second: &ChamberHit,
    ) -> Option<LineParams> {
        let line = match self.config.seed_projection {
            SeedProjection::FirstHit => {
                let projected = chamber.layer_to_global(second.layer, &first.local)?;
                let local = chamber.to_local(&projected);
                let dz = projected.z - first.global.z;
                LineParams::new(
                    first.local.x,
                    first.local.y,
                    (local.x - first.chamber.x) / dz,
                    (local.y - first.chamber.y) / dz,
                )
            }
            SeedProjection::SecondHit => {
                let dz = second.depth() - first.depth();
                let slope_u = (second.chamber.x - first.chamber.x) / dz;
                let slope_v = (second.chamber.y - first.chamber.y) / dz;
                LineParams::new(
                    first.chamber.x - slope_u * first.depth(),
                    first.chamber.y - slope_v * first.depth(),
                    slope_u,
                    slope_v,
                )
            }
        };
        (line.slope_u.is_finite() && line.slope_v.is_finite()).then_some(line)
    }

    /// Adds compatible hits to `proto`, then settles contested layers.
    fn grow<G: ChamberGeometry>(
        &self,
        chamber: &G,
        prepared: &[ChamberHit],
        used: &[bool],
        proto: &mut ProtoSegment,
        close_hits: &mut Vec<usize>,
        diagnostics: &mut Diagnostics,
    ) {
        close_hits.clear();
        let window = ProximityWindow::from(&self.config);
        let seeds = (proto.hits()[0], proto.hits()[1]);

        for (i, hit) in prepared.iter().enumerate() {
            if i == seeds.0 || i == seeds.1 || used[i] {
                continue;
            }
            if !is_hit_near_line(chamber, proto.line(), hit, &window) {
                continue;
            }
            if proto.has_hit_on_layer(prepared, hit.layer) {
                close_hits.push(i);
            } else {
                proto.add_hit(i);
            }
        }

        if proto.len() < 3 || close_hits.is_empty() {
            return;
        }
        proto.refit(prepared, diagnostics);

        for &candidate in close_hits.iter() {
            match resolve_conflict(proto, prepared, candidate, diagnostics) {
                Resolution::Accepted(next) => {
                    *proto = next;
                    diagnostics.replacements_accepted += 1;
                }
                Resolution::Rejected => diagnostics.replacements_rejected += 1,
            }
        }
    }

    /// Turns an accepted candidate into an output segment.
    fn finalize<G, H>(
        chamber: &G,
        prepared: &[ChamberHit],
        proto: &ProtoSegment,
        input: &[H],
        diagnostics: &mut Diagnostics,
    ) -> Segment<H>
    where
        G: ChamberGeometry,
        H: RecHit + Clone,
    {
        let line = proto.line();
        let local_position: Point3<f64> = line.intercept();
        let mut local_direction = line.direction();

        // Point away from the detector origin.
        let global_z_pos = chamber.to_global(&local_position).z;
        let global_z_dir = chamber.vector_to_global(&local_direction).z;
        if global_z_pos * global_z_dir < 0.0 {
            local_direction = -local_direction;
        }

        let errors = segment_errors(&proto.hit_refs(prepared), diagnostics);
        let hit_indices: Vec<usize> = proto
            .hits()
            .iter()
            .map(|&i| prepared[i].input_index)
            .collect();
        let hits = hit_indices.iter().map(|&i| input[i].clone()).collect();

        Segment {
            hits,
            hit_indices,
            local_position,
            local_direction,
            errors,
            chi2: proto.chi2(),
        }
    }
}

impl SegmentAlgorithm for DfSegmentBuilder {
    type State = DfState;

    fn name(&self) -> &'static str {
        "DF"
    }

    fn configure(&mut self, config: SegmentConfig) {
        self.config = config;
    }

    fn config(&self) -> &SegmentConfig {
        &self.config
    }

    fn build<G, H>(&self, chamber: &G, hits: &[H], state: &mut Self::State) -> Result<Vec<Segment<H>>>
    where
        G: ChamberGeometry,
        H: RecHit + Clone,
    {
        state.reset();

        let mut segments = Vec::new();
        let n = hits.len();
        if n < MIN_HITS_IN_CHAMBER {
            return Ok(segments);
        }

        let DfState {
            hits: prepared,
            used,
            close_hits,
            diagnostics,
        } = state;
        *prepared = prepare_hits(chamber, hits, diagnostics)?;
        used.resize(n, false);

        let required = self.required_hits(n);
        let min_apart = i16::from(self.config.min_layers_apart);

        for i1 in 0..n {
            if used[i1] {
                continue;
            }
            for i2 in (1..n).rev() {
                if i2 == i1 || used[i2] {
                    continue;
                }
                diagnostics.seed_pairs += 1;

                let (first, second) = (&prepared[i1], &prepared[i2]);
                if i16::from(second.layer) - i16::from(first.layer) < min_apart {
                    diagnostics.rejected_separation += 1;
                    continue;
                }

                let Some(line) = self.seed_line(chamber, first, second) else {
                    debug!("seed ({i1}, {i2}) has no depth separation");
                    diagnostics.rejected_slope += 1;
                    continue;
                };
                if line.slope_v.abs() > self.config.tan_theta_max
                    || line.slope_u.abs() > self.config.tan_phi_max
                {
                    debug!(
                        "seed ({i1}, {i2}) rejected: slopes ({:.3}, {:.3})",
                        line.slope_u, line.slope_v
                    );
                    diagnostics.rejected_slope += 1;
                    continue;
                }

                let mut proto = ProtoSegment::seeded(i1, i2, line);
                self.grow(chamber, prepared, used, &mut proto, close_hits, diagnostics);

                if proto.len() < required {
                    if self.config.debug {
                        debug!(
                            "seed ({i1}, {i2}): {} hits, {required} required",
                            proto.len()
                        );
                    }
                    diagnostics.candidates_too_small += 1;
                    continue;
                }

                proto.refit(prepared, diagnostics);
                let segment = Self::finalize(chamber, prepared, &proto, hits, diagnostics);
                if self.config.debug {
                    debug!(
                        "segment {} from seed ({i1}, {i2}): layers {:?} chi2 {:.4}",
                        segments.len(),
                        segment.layers(),
                        segment.chi2
                    );
                }
                segments.push(segment);

                let unused = (0..n).filter(|&i| !used[i] && !proto.contains(i)).count();
                if unused < MIN_HITS_IN_CHAMBER
                    || segments.len() >= MAX_SEGMENTS_PER_CHAMBER
                {
                    return Ok(segments);
                }
                for &i in proto.hits().iter().chain(close_hits.iter()) {
                    used[i] = true;
                }
            }
        }

        Ok(segments)
    }

    fn diagnostics<'s>(&self, state: &'s Self::State) -> &'s Diagnostics {
        state.diagnostics()
    }
}
