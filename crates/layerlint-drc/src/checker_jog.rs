use std::collections::BTreeSet;

use layerlint_core::{BBox, PointId};

use crate::condition::LayerConditions;
use crate::rules::{ConditionRule, RuleKind, RuleTable};
use crate::sequence::{edge_flags, SequenceClassifier, SequenceState};
use crate::violation::{DrcViolation, ViolationEnumType, ViolationStore};

/// Checker for jog-to-jog spacing: recognizes a jog (one trigger edge, one
/// or more qualifying middle edges, then a success edge) by feeding
/// per-edge bit-flags into a [`SequenceClassifier`] while walking each
/// boundary cycle.
pub struct JogChecker<'a> {
    rules: &'a RuleTable,
}

impl<'a> JogChecker<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    /// Returns true only when no jog violation was found on this layer.
    pub fn check(&self, cond: &mut LayerConditions, store: &mut ViolationStore) -> bool {
        let mut clean = true;

        let rules: Vec<ConditionRule> = self
            .rules
            .rules_above(cond.layer_id, RuleKind::JogToJog, 0)
            .into_iter()
            .cloned()
            .collect();

        let loops: Vec<Vec<PointId>> = cond.arena.loops().map(|r| r.collect()).collect();
        for rule in &rules {
            let ConditionRule::JogToJog {
                jog_width,
                jog_to_jog_spacing,
            } = rule
            else {
                continue;
            };

            for ids in &loops {
                clean &= self.scan_loop(cond, store, ids, *jog_width, *jog_to_jog_spacing);
            }
        }

        clean
    }

    fn scan_loop(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
        ids: &[PointId],
        jog_width: i32,
        jog_to_jog_spacing: i32,
    ) -> bool {
        let mut clean = true;
        let n = ids.len();

        for start in 0..n {
            if cond.is_checked(RuleKind::JogToJog, ids[start]) {
                continue;
            }

            let mut classifier = SequenceClassifier::new(
                edge_flags::SHORT,
                edge_flags::SHORT,
                edge_flags::LONG,
            )
            .with_filter_value(jog_to_jog_spacing);

            // Points of the trigger and middle edges; the success edge only
            // terminates the pattern and contributes no point.
            let mut involved = vec![ids[start]];
            for k in 0..n {
                let a = ids[(start + k) % n];
                let b = ids[(start + k + 1) % n];
                let state = classifier.apply(self.edge_flag_bits(cond, a, b, jog_width));
                match state {
                    SequenceState::Trigger | SequenceState::Recording => involved.push(b),
                    _ => break,
                }
            }

            if classifier.state() != SequenceState::Success {
                continue;
            }

            // Refinement: the jog span gates the match.
            let span = cond
                .arena
                .distance(involved[0], involved[involved.len() - 1]);
            if classifier.apply_value(span) != SequenceState::Success {
                continue;
            }

            let mut bbox = BBox::from_point(cond.arena.point(involved[0]).point());
            let mut net_ids = BTreeSet::new();
            for &id in &involved {
                bbox.expand(cond.arena.point(id).point());
                net_ids.insert(cond.arena.point(id).net_id);
                cond.set_checked(RuleKind::JogToJog, id);
            }

            store.add(DrcViolation::rect(
                cond.layer_id,
                ViolationEnumType::JogToJog,
                net_ids,
                bbox,
            ));
            clean = false;
        }

        clean
    }

    fn edge_flag_bits(&self, cond: &LayerConditions, a: PointId, b: PointId, jog_width: i32) -> u64 {
        let pa = cond.arena.point(a);
        let pb = cond.arena.point(b);
        let mut flags = if pa.distance(pb) < jog_width {
            edge_flags::SHORT
        } else {
            edge_flags::LONG
        };
        flags |= if pa.y == pb.y {
            edge_flags::HORIZONTAL
        } else {
            edge_flags::VERTICAL
        };
        flags |= match pa.corner {
            layerlint_core::CornerType::Convex => edge_flags::FROM_CONVEX,
            layerlint_core::CornerType::Concave => edge_flags::FROM_CONCAVE,
            layerlint_core::CornerType::None => 0,
        };
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerlint_core::{BoundaryArena, Point};

    fn jog_rules(jog_width: i32, spacing: i32) -> RuleTable {
        RuleTable::builder()
            .add_rule(
                1,
                ConditionRule::JogToJog {
                    jog_width,
                    jog_to_jog_spacing: spacing,
                },
            )
            .unwrap()
            .build()
    }

    /// Staircase whose top-left corner jogs down in steps of 5, 3, 2
    /// before a 40-long run. The jog span between the chain ends is 10.
    fn staircase_conditions() -> LayerConditions {
        let verts = vec![
            Point::new(0, 50),
            Point::new(0, 45),
            Point::new(3, 45),
            Point::new(3, 43),
            Point::new(43, 43),
            Point::new(43, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ];
        let mut arena = BoundaryArena::new();
        arena.add_polygon(5, &verts).unwrap();
        LayerConditions::new(1, arena)
    }

    #[test]
    fn test_jog_detected_under_spacing() {
        let rules = jog_rules(10, 15);
        let mut cond = staircase_conditions();
        let mut store = ViolationStore::new();
        let clean = JogChecker::new(&rules).check(&mut cond, &mut store);
        assert!(!clean);
        let violations = store.get(ViolationEnumType::JogToJog);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].bbox(), BBox::new(0, 43, 3, 50));
    }

    #[test]
    fn test_jog_span_filter_rejects_wide_jogs() {
        // Span is 10; a spacing rule of 5 means the jog is wide enough.
        let rules = jog_rules(10, 5);
        let mut cond = staircase_conditions();
        let mut store = ViolationStore::new();
        assert!(JogChecker::new(&rules).check(&mut cond, &mut store));
        assert!(store.is_empty());
    }

    #[test]
    fn test_jog_idempotent_via_checked_flags() {
        let rules = jog_rules(10, 15);
        let mut cond = staircase_conditions();
        let checker = JogChecker::new(&rules);

        let mut store = ViolationStore::new();
        checker.check(&mut cond, &mut store);
        assert_eq!(store.total(), 1);

        let mut second = ViolationStore::new();
        assert!(checker.check(&mut cond, &mut second));
        assert!(second.is_empty());
    }

    #[test]
    fn test_no_jog_on_plain_square() {
        let rules = jog_rules(10, 15);
        let verts = vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ];
        let mut arena = BoundaryArena::new();
        arena.add_polygon(1, &verts).unwrap();
        let mut cond = LayerConditions::new(1, arena);
        let mut store = ViolationStore::new();
        assert!(JogChecker::new(&rules).check(&mut cond, &mut store));
        assert!(store.is_empty());
    }
}
