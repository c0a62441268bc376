#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use chamberseg_algorithms::{DfSegmentBuilder, DfState, SegmentAlgorithm, SegmentConfig};
use chamberseg_core::config::SeedProjection;
use chamberseg_core::diagnostics::MatrixKind;
use chamberseg_core::geometry::{ChamberGeometry, PlanarChamber};
use chamberseg_core::hit::{LocalError, RecHitData};
use chamberseg_core::segment::Segment;
use nalgebra::{Matrix4, Point3};
use std::collections::HashSet;

fn chamber_at(z: f64) -> PlanarChamber {
    PlanarChamber::aligned(Point3::new(0.0, 200.0, z), 2.0, 6)
}

fn depth(chamber: &PlanarChamber, layer: u8) -> f64 {
    chamber.layer_depths()[usize::from(layer) - 1]
}

/// Hit on the line `u = u0 + su * z`, `v = v0 + sv * z`.
fn hit_on(
    chamber: &PlanarChamber,
    layer: u8,
    (u0, v0, su, sv): (f64, f64, f64, f64),
    error: LocalError,
) -> RecHitData {
    let z = depth(chamber, layer);
    RecHitData::new(layer, u0 + su * z, v0 + sv * z, error)
}

fn sigma() -> LocalError {
    LocalError::uncorrelated(0.05, 0.2)
}

fn run(
    config: SegmentConfig,
    chamber: &PlanarChamber,
    hits: &[RecHitData],
) -> (Vec<Segment>, DfState) {
    let builder = DfSegmentBuilder::new(config);
    let mut state = builder.create_state();
    let segments = builder.build(chamber, hits, &mut state).unwrap();
    (segments, state)
}

fn sorted_layers(segment: &Segment) -> Vec<u8> {
    let mut layers = segment.layers();
    layers.sort_unstable();
    layers
}

#[test]
fn test_fewer_than_three_hits() {
    let chamber = chamber_at(700.0);
    let line = (0.0, 0.0, 0.02, 0.05);
    let hits = vec![
        hit_on(&chamber, 1, line, sigma()),
        hit_on(&chamber, 6, line, sigma()),
    ];
    let (segments, state) = run(SegmentConfig::default(), &chamber, &hits);
    assert!(segments.is_empty());
    assert_eq!(state.diagnostics().seed_pairs, 0);
}

#[test]
fn test_single_layer_gives_nothing() {
    let chamber = chamber_at(700.0);
    let hits: Vec<RecHitData> = (0..10)
        .map(|i| RecHitData::new(3, f64::from(i) * 0.5, 0.0, sigma()))
        .collect();
    let (segments, state) = run(SegmentConfig::default(), &chamber, &hits);
    assert!(segments.is_empty());
    assert_eq!(
        state.diagnostics().rejected_separation,
        state.diagnostics().seed_pairs
    );
}

#[test]
fn test_four_collinear_exact_hits() {
    let chamber = chamber_at(700.0);
    let line = (1.0, -1.0, 0.02, 0.05);
    let exact = LocalError::new(0.0, 0.0, 0.0);
    // Seeds on layers 1 and 4, extras on layers 2 and 5.
    let hits = vec![
        hit_on(&chamber, 1, line, exact),
        hit_on(&chamber, 2, line, exact),
        hit_on(&chamber, 5, line, exact),
        hit_on(&chamber, 4, line, exact),
    ];
    let config = SegmentConfig::default().with_min_layers_apart(3);
    let (segments, state) = run(config, &chamber, &hits);

    assert_eq!(segments.len(), 1);
    let seg = &segments[0];
    assert_eq!(sorted_layers(seg), vec![1, 2, 4, 5]);
    assert_relative_eq!(seg.chi2, 0.0, epsilon = 1e-12);
    // No information in the hits: zero error matrix, every fallback recorded.
    assert_eq!(seg.errors, Matrix4::zeros());
    let diag = state.diagnostics();
    assert_eq!(diag.count_degenerate(MatrixKind::HitCovariance), 4);
    assert!(diag.count_degenerate(MatrixKind::NormalEquations) >= 1);
    assert_eq!(diag.count_degenerate(MatrixKind::StackedCovariance), 1);
    assert_eq!(diag.count_degenerate(MatrixKind::SegmentInformation), 1);
}

#[test]
fn test_far_hit_is_not_attached() {
    let chamber = chamber_at(700.0);
    let line = (0.5, 2.0, 0.03, -0.02);
    let mut hits: Vec<RecHitData> = (1..=6).map(|l| hit_on(&chamber, l, line, sigma())).collect();
    let mut far = hit_on(&chamber, 3, line, sigma());
    far.x += 50.0;
    hits.push(far);

    let (segments, _) = run(SegmentConfig::default(), &chamber, &hits);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len(), 6);
    assert!(!segments[0].hit_indices.contains(&6));
    assert_relative_eq!(segments[0].chi2, 0.0, epsilon = 1e-9);
}

#[test]
fn test_conflict_keeps_better_hit() {
    let chamber = chamber_at(700.0);
    let line = (0.0, 0.0, 0.04, 0.02);
    let mut offset = hit_on(&chamber, 3, line, sigma());
    offset.x += 0.3;
    let hits = vec![
        hit_on(&chamber, 1, line, sigma()),
        offset,
        hit_on(&chamber, 2, line, sigma()),
        hit_on(&chamber, 3, line, sigma()),
        hit_on(&chamber, 4, line, sigma()),
        hit_on(&chamber, 5, line, sigma()),
        hit_on(&chamber, 6, line, sigma()),
    ];

    let (segments, state) = run(SegmentConfig::default(), &chamber, &hits);
    assert_eq!(segments.len(), 1);
    let seg = &segments[0];
    assert_eq!(sorted_layers(seg), vec![1, 2, 3, 4, 5, 6]);
    assert!(seg.hit_indices.contains(&3));
    assert!(!seg.hit_indices.contains(&1));
    assert_relative_eq!(seg.chi2, 0.0, epsilon = 1e-9);
    assert_eq!(state.diagnostics().replacements_accepted, 1);
}

#[test]
fn test_output_is_capped_at_five_segments() {
    let chamber = chamber_at(700.0);
    let mut hits = Vec::new();
    for track in 0..6 {
        let line = (-50.0 + 20.0 * f64::from(track), 1.0, 0.01, 0.03);
        hits.extend((1..=6).map(|l| hit_on(&chamber, l, line, sigma())));
    }

    let builder = DfSegmentBuilder::default();
    // 36 hits: two extra hits required on top of the base three.
    assert_eq!(builder.required_hits(hits.len()), 5);

    let (segments, _) = run(SegmentConfig::default(), &chamber, &hits);
    assert_eq!(segments.len(), 5);
    for seg in &segments {
        assert_eq!(sorted_layers(seg), vec![1, 2, 3, 4, 5, 6]);
        assert_relative_eq!(seg.chi2, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_first_seed_opens_a_second_segment() {
    let chamber = chamber_at(700.0);
    let error = sigma();
    let steep = (15.0, 0.0, 3.0, 0.0);
    let flat = (0.0, 0.0, 0.0, 0.0);
    // Layer 1 hit at u = 0 sits on both tracks.
    let mut hits = vec![hit_on(&chamber, 1, flat, error)];
    hits.extend((2..=6).map(|l| hit_on(&chamber, l, flat, error)));
    hits.extend((2..=6).map(|l| hit_on(&chamber, l, steep, error)));

    let config = SegmentConfig::default()
        .with_seed_projection(SeedProjection::SecondHit)
        .with_slope_limits(1.2, 5.0);
    let (segments, state) = run(config, &chamber, &hits);

    assert_eq!(segments.len(), 2);
    let mut steep_hits = segments[0].hit_indices.clone();
    steep_hits.sort_unstable();
    assert_eq!(steep_hits, vec![0, 6, 7, 8, 9, 10]);
    let mut flat_hits = segments[1].hit_indices.clone();
    flat_hits.sort_unstable();
    assert_eq!(flat_hits, vec![0, 1, 2, 3, 4, 5]);
    for seg in &segments {
        assert_relative_eq!(seg.chi2, 0.0, epsilon = 1e-9);
    }
    assert_eq!(state.used_hits(), vec![0, 6, 7, 8, 9, 10]);
}

#[test]
fn test_direction_points_away_from_origin() {
    for z in [700.0, -700.0] {
        let chamber = chamber_at(z);
        let line = (1.0, 1.0, 0.02, 0.04);
        let hits: Vec<RecHitData> = (1..=6).map(|l| hit_on(&chamber, l, line, sigma())).collect();

        let (segments, _) = run(SegmentConfig::default(), &chamber, &hits);
        assert_eq!(segments.len(), 1, "chamber at z = {}", z);
        let seg = &segments[0];
        assert_relative_eq!(seg.local_direction.norm(), 1.0, epsilon = 1e-12);

        let pos_z = chamber.to_global(&seg.local_position).z;
        let dir_z = chamber.vector_to_global(&seg.local_direction).z;
        assert!(pos_z * dir_z > 0.0, "chamber at z = {}", z);

        let (su, sv) = seg.slopes().unwrap();
        assert_relative_eq!(su, 0.02, epsilon = 1e-9);
        assert_relative_eq!(sv, 0.04, epsilon = 1e-9);
    }
}

/// Deterministic pseudo-random sequence in `[0, 1)`.
fn lcg(seed: &mut u64) -> f64 {
    *seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
    #[allow(clippy::cast_precision_loss)]
    let value = (*seed >> 11) as f64 / (1u64 << 53) as f64;
    value
}

fn noisy_event(chamber: &PlanarChamber) -> Vec<RecHitData> {
    let mut seed = 0x5eed;
    let mut hits = Vec::new();
    for line in [(-20.0, 0.0, 0.01, 0.05), (5.0, 3.0, -0.02, 0.0), (30.0, -4.0, 0.0, 0.1)] {
        for layer in 1..=6 {
            let mut hit = hit_on(chamber, layer, line, sigma());
            hit.x += 0.05 * (lcg(&mut seed) - 0.5);
            hit.y += 0.2 * (lcg(&mut seed) - 0.5);
            hits.push(hit);
        }
    }
    for _ in 0..8 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let layer = 1 + (lcg(&mut seed) * 6.0) as u8;
        let u = 80.0 * (lcg(&mut seed) - 0.5);
        let v = 40.0 * (lcg(&mut seed) - 0.5);
        hits.push(RecHitData::new(layer, u, v, sigma()));
    }
    hits
}

#[test]
fn test_output_invariants_on_noisy_event() {
    let chamber = chamber_at(650.0);
    let hits = noisy_event(&chamber);
    let builder = DfSegmentBuilder::default();
    let required = builder.required_hits(hits.len());

    let (segments, _) = run(SegmentConfig::default(), &chamber, &hits);
    assert!(!segments.is_empty());
    assert!(segments.len() <= 5);

    for (i, seg) in segments.iter().enumerate() {
        assert!(seg.len() >= required);
        let layers: HashSet<u8> = seg.layers().into_iter().collect();
        assert_eq!(layers.len(), seg.len(), "duplicate layer in segment");
        // Only a first seed carried over from an earlier segment is shared.
        let hits: HashSet<usize> = seg.hit_indices.iter().copied().collect();
        for earlier in &segments[..i] {
            let shared = earlier.hit_indices.iter().filter(|h| hits.contains(h)).count();
            assert!(shared <= 1, "segments share {} hits", shared);
        }
        assert!(seg.chi2.is_finite() && seg.chi2 >= 0.0);
        for i in 0..4 {
            assert!(seg.errors[(i, i)] >= 0.0);
            for j in 0..4 {
                assert_relative_eq!(seg.errors[(i, j)], seg.errors[(j, i)], epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_builds_are_deterministic() {
    let chamber = chamber_at(650.0);
    let hits = noisy_event(&chamber);
    let (first, first_state) = run(SegmentConfig::default(), &chamber, &hits);
    let (second, second_state) = run(SegmentConfig::default(), &chamber, &hits);
    assert_eq!(first, second);
    assert_eq!(first_state.diagnostics(), second_state.diagnostics());
}
