//! Same-layer conflict resolution.
//!
//! When a second hit on an already occupied layer is compatible with the
//! candidate line, the two are compared by the chi-square of the refitted
//! segment. Evaluation works on a copy; the caller's proto-segment is only
//! replaced when the swap is accepted.

use crate::chamber_hit::ChamberHit;
use crate::proto::ProtoSegment;
use chamberseg_core::diagnostics::Diagnostics;

/// Result of trying a contested hit in place of the incumbent.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The swap kept or lowered chi-square.
    Accepted(ProtoSegment),
    /// The swap was worse, or the hit was already on the segment.
    Rejected,
}

/// Tries `candidate` on its layer in place of whatever hit occupies it.
///
/// The swap is accepted when the refitted chi-square is not greater than
/// the current one.
#[must_use]
pub fn resolve_conflict(
    proto: &ProtoSegment,
    prepared: &[ChamberHit],
    candidate: usize,
    diagnostics: &mut Diagnostics,
) -> Resolution {
    if proto.contains(candidate) {
        return Resolution::Rejected;
    }
    let mut trial = proto.clone();
    trial.remove_layer(prepared, prepared[candidate].layer);
    trial.add_hit(candidate);
    trial.refit(prepared, diagnostics);

    if trial.chi2() > proto.chi2() {
        Resolution::Rejected
    } else {
        Resolution::Accepted(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::LineParams;
    use crate::test_support::{hit_at, on_line};

    /// Six hits on a line plus two alternatives on layer 3 (index 6, 7).
    fn prepared() -> Vec<ChamberHit> {
        let truth = LineParams::new(0.0, 0.0, 0.05, 0.05);
        let mut hits = on_line(&truth, 0.1);
        let p = truth.at(-1.0);
        hits.push(hit_at(3, p.x + 0.5, p.y, -1.0, 0.1));
        hits.push(hit_at(3, p.x + 0.05, p.y, -1.0, 0.1));
        hits
    }

    fn proto_with(prepared: &[ChamberHit], layer3: usize) -> ProtoSegment {
        let mut proto = ProtoSegment::seeded(0, 5, LineParams::default());
        for i in [1, layer3, 3, 4] {
            proto.add_hit(i);
        }
        proto.refit(prepared, &mut Diagnostics::new());
        proto
    }

    #[test]
    fn test_better_hit_replaces_worse() {
        let prepared = prepared();
        let proto = proto_with(&prepared, 6);
        let before = proto.chi2();

        match resolve_conflict(&proto, &prepared, 2, &mut Diagnostics::new()) {
            Resolution::Accepted(next) => {
                assert!(next.chi2() <= before);
                assert!(next.contains(2));
                assert!(!next.contains(6));
                assert_eq!(next.len(), proto.len());
            }
            Resolution::Rejected => panic!("exact hit should replace the offset one"),
        }
    }

    #[test]
    fn test_worse_hit_is_rejected() {
        let prepared = prepared();
        let proto = proto_with(&prepared, 2);

        let outcome = resolve_conflict(&proto, &prepared, 6, &mut Diagnostics::new());
        assert_eq!(outcome, Resolution::Rejected);
    }

    #[test]
    fn test_duplicate_candidate_is_rejected() {
        let prepared = prepared();
        let proto = proto_with(&prepared, 2);

        let outcome = resolve_conflict(&proto, &prepared, 2, &mut Diagnostics::new());
        assert_eq!(outcome, Resolution::Rejected);
    }

    #[test]
    fn test_resolution_never_raises_chi_square() {
        let prepared = prepared();
        for incumbent in [2, 6, 7] {
            let proto = proto_with(&prepared, incumbent);
            for candidate in [2, 6, 7] {
                if let Resolution::Accepted(next) =
                    resolve_conflict(&proto, &prepared, candidate, &mut Diagnostics::new())
                {
                    assert!(next.chi2() <= proto.chi2());
                }
            }
        }
    }
}
