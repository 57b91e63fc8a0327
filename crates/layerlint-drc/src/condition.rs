use std::collections::BTreeMap;

use layerlint_core::{BoundaryArena, LayerId, PointId};

use crate::rules::{RuleKind, RuleTable};

/// One layer's boundary model plus the bookkeeping the checkers mutate:
/// per-rule-kind candidate pair lists and per-rule-kind "checked" flags.
///
/// The arena topology and the rule table are immutable during the check
/// stage; only the flags (and the violation store, held elsewhere) change.
/// A layer's points are disjoint from every other layer's, so a worker
/// owning this struct never contends with another worker.
#[derive(Debug)]
pub struct LayerConditions {
    pub layer_id: LayerId,
    pub arena: BoundaryArena,
    candidates: BTreeMap<RuleKind, Vec<(PointId, PointId)>>,
    /// One bitset namespace per rule kind, indexed by point id. Kept off
    /// the point itself so rule families cannot interfere.
    checked: BTreeMap<RuleKind, Vec<bool>>,
}

impl LayerConditions {
    pub fn new(layer_id: LayerId, arena: BoundaryArena) -> Self {
        Self {
            layer_id,
            arena,
            candidates: BTreeMap::new(),
            checked: BTreeMap::new(),
        }
    }

    /// Gather candidate pairs per rule kind. The MinStep and MinStepLef58
    /// tables share one candidate set under [`RuleKind::MinStep`]: any edge
    /// below the larger of the two max thresholds is a candidate for both.
    /// Iteration order is loop order then boundary order (deterministic).
    pub fn build_candidates(&mut self, rules: &RuleTable) {
        let step_max = rules.max_threshold(self.layer_id, RuleKind::MinStep);
        let lef58_max = rules.max_threshold(self.layer_id, RuleKind::MinStepLef58);
        if let Some(max_length) = step_max.max(lef58_max) {
            let pairs = self.arena.short_edges(max_length);
            if !pairs.is_empty() {
                self.candidates.insert(RuleKind::MinStep, pairs);
            }
        }
    }

    pub fn candidates(&self, kind: RuleKind) -> &[(PointId, PointId)] {
        self.candidates
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_checked(&self, kind: RuleKind, id: PointId) -> bool {
        self.checked
            .get(&kind)
            .map(|flags| flags[id])
            .unwrap_or(false)
    }

    pub fn set_checked(&mut self, kind: RuleKind, id: PointId) {
        let len = self.arena.len();
        self.checked.entry(kind).or_insert_with(|| vec![false; len])[id] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConditionRule;
    use layerlint_core::Point;

    fn arena_with_steps() -> BoundaryArena {
        // Staircase outline whose upper-right corner carries edges of
        // lengths 3 and 2, below the rule threshold of 10.
        let verts = vec![
            Point::new(0, 0),
            Point::new(40, 0),
            Point::new(40, 3),
            Point::new(38, 3),
            Point::new(38, 10),
            Point::new(0, 10),
        ];
        let mut arena = BoundaryArena::new();
        arena.add_polygon(1, &verts).unwrap();
        arena
    }

    #[test]
    fn test_candidates_from_rule_threshold() {
        let rules = RuleTable::builder()
            .add_rule(
                1,
                ConditionRule::MinStep {
                    min_step_length: 10,
                    max_edges: None,
                },
            )
            .unwrap()
            .build();
        let mut cond = LayerConditions::new(1, arena_with_steps());
        cond.build_candidates(&rules);
        assert_eq!(cond.candidates(RuleKind::MinStep).len(), 2);
        assert!(cond.candidates(RuleKind::JogToJog).is_empty());
    }

    #[test]
    fn test_no_rules_no_candidates() {
        let rules = RuleTable::builder().build();
        let mut cond = LayerConditions::new(1, arena_with_steps());
        cond.build_candidates(&rules);
        assert!(cond.candidates(RuleKind::MinStep).is_empty());
    }

    #[test]
    fn test_checked_flags_are_per_kind() {
        let mut cond = LayerConditions::new(1, arena_with_steps());
        cond.set_checked(RuleKind::MinStep, 2);
        assert!(cond.is_checked(RuleKind::MinStep, 2));
        assert!(!cond.is_checked(RuleKind::JogToJog, 2));
        assert!(!cond.is_checked(RuleKind::MinStep, 3));
    }
}
