//! High-level helpers that run the builder over one or many chambers.

use crate::builder::{DfSegmentBuilder, DfState};
use chamberseg_core::config::SegmentConfig;
use chamberseg_core::diagnostics::Diagnostics;
use chamberseg_core::error::Result;
use chamberseg_core::geometry::ChamberGeometry;
use chamberseg_core::hit::{RecHit, RecHitData};
use chamberseg_core::segment::{Segment, SegmentAlgorithm};
use rayon::prelude::*;

/// Segments found in one chamber and what happened while finding them.
#[derive(Clone, Debug, PartialEq)]
pub struct ChamberSegments<H = RecHitData> {
    /// Output segments, in emission order.
    pub segments: Vec<Segment<H>>,
    /// Counters and fallbacks of the search.
    pub diagnostics: Diagnostics,
}

/// Builds segments for a single chamber with a fresh state.
///
/// # Errors
/// Returns an error if a hit references a layer the chamber does not have.
pub fn build_segments<G, H>(
    chamber: &G,
    hits: &[H],
    config: &SegmentConfig,
) -> Result<ChamberSegments<H>>
where
    G: ChamberGeometry,
    H: RecHit + Clone,
{
    let builder = DfSegmentBuilder::new(config.clone());
    let mut state = DfState::default();
    run(&builder, chamber, hits, &mut state)
}

/// Builds segments for many chambers.
///
/// Each chamber gets its own builder state, so chambers are independent and
/// may be processed in parallel. Results keep the input order.
pub fn build_segments_batch<G, H>(
    chambers: &[(G, Vec<H>)],
    config: &SegmentConfig,
    parallel: bool,
) -> Vec<Result<ChamberSegments<H>>>
where
    G: ChamberGeometry,
    H: RecHit + Clone,
{
    let builder = DfSegmentBuilder::new(config.clone());
    if parallel {
        chambers
            .par_iter()
            .map_init(DfState::default, |state, (chamber, hits)| {
                run(&builder, chamber, hits, state)
            })
            .collect()
    } else {
        let mut state = DfState::default();
        chambers
            .iter()
            .map(|(chamber, hits)| run(&builder, chamber, hits, &mut state))
            .collect()
    }
}

fn run<G, H>(
    builder: &DfSegmentBuilder,
    chamber: &G,
    hits: &[H],
    state: &mut DfState,
) -> Result<ChamberSegments<H>>
where
    G: ChamberGeometry,
    H: RecHit + Clone,
{
    let segments = builder.build(chamber, hits, state)?;
    Ok(ChamberSegments {
        segments,
        diagnostics: state.take_diagnostics(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamberseg_core::geometry::PlanarChamber;
    use chamberseg_core::hit::LocalError;
    use nalgebra::Point3;

    fn chamber_with_track(z: f64, u0: f64) -> (PlanarChamber, Vec<RecHitData>) {
        let chamber = PlanarChamber::aligned(Point3::new(0.0, 250.0, z), 2.5, 6);
        let hits = chamber
            .layer_depths()
            .iter()
            .zip(1u8..)
            .map(|(&depth, layer)| {
                RecHitData::new(
                    layer,
                    u0 + 0.01 * depth,
                    -1.0 + 0.04 * depth,
                    LocalError::uncorrelated(0.05, 0.2),
                )
            })
            .collect();
        (chamber, hits)
    }

    #[test]
    fn test_single_chamber() {
        let (chamber, hits) = chamber_with_track(800.0, 2.0);
        let result = build_segments(&chamber, &hits, &SegmentConfig::default()).unwrap();
        assert_eq!(result.segments.len(), 1);
        assert!(result.diagnostics.seed_pairs > 0);
        assert!(!result.diagnostics.has_degenerate());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let chambers: Vec<_> = (0..16)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                chamber_with_track(sign * 800.0, f64::from(i))
            })
            .collect();
        let config = SegmentConfig::default();

        let sequential = build_segments_batch(&chambers, &config, false);
        let parallel = build_segments_batch(&chambers, &config, true);
        assert_eq!(sequential.len(), chambers.len());
        assert_eq!(sequential, parallel);
        for result in &sequential {
            assert_eq!(result.as_ref().unwrap().segments.len(), 1);
        }
    }

    #[test]
    fn test_batch_reports_errors_per_chamber() {
        let (chamber, mut bad) = chamber_with_track(800.0, 0.0);
        bad[2].layer = 7;
        let good = chamber_with_track(800.0, 1.0);
        let results = build_segments_batch(&[(chamber, bad), good], &SegmentConfig::default(), true);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
