use std::collections::BTreeSet;

use log::debug;

use layerlint_core::{BBox, CornerType, PointId};

use crate::condition::LayerConditions;
use crate::rules::{ConditionRule, RuleKind, RuleTable};
use crate::violation::{DrcViolation, ViolationEnumType, ViolationStore};

/// Checker for the MinStep rule family: boundary segments shorter than the
/// rule's minimum step length, plus the LEF58 refinement requiring a
/// minimum adjacent-edge length around asymmetric convex/concave corners.
pub struct MinStepChecker<'a> {
    rules: &'a RuleTable,
}

impl<'a> MinStepChecker<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    /// Min-step only. Returns true only when this pass found no violation
    /// of the family (coarse gate; the store holds the actual results).
    pub fn check_fast_mode(&self, cond: &mut LayerConditions, store: &mut ViolationStore) -> bool {
        self.check_min_step(cond, store, false)
    }

    /// Min-step plus the LEF58 refinement.
    pub fn check_complete_mode(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
    ) -> bool {
        self.check_min_step(cond, store, true)
    }

    fn check_min_step(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
        with_lef58: bool,
    ) -> bool {
        let mut clean = true;

        let pairs = cond.candidates(RuleKind::MinStep).to_vec();
        for (mut first, mut second) in pairs {
            if cond.is_checked(RuleKind::MinStep, first)
                && cond.is_checked(RuleKind::MinStep, second)
            {
                continue;
            }

            // Canonicalize pair direction: `second` must follow `first`.
            let first_next = cond.arena.next_endpoint(first);
            let second_next = cond.arena.next_endpoint(second);
            if first_next != second && second_next != first {
                debug!(
                    "layer {}: candidate pair ({first}, {second}) is not adjacent, skipping",
                    cond.layer_id
                );
                continue;
            } else if second_next == first {
                std::mem::swap(&mut first, &mut second);
            }

            clean &= self.check_min_step_segment(cond, store, first, second);
            if with_lef58 {
                clean &= self.check_min_step_lef58_segment(cond, store, first, second);
            }
        }

        clean
    }

    fn check_min_step_segment(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
        first: PointId,
        second: PointId,
    ) -> bool {
        let mut clean = true;

        let step_edge_length = cond.arena.distance(first, second);
        for rule in self
            .rules
            .rules_above(cond.layer_id, RuleKind::MinStep, step_edge_length)
        {
            let ConditionRule::MinStep { min_step_length, .. } = rule else {
                continue;
            };
            let min_step_length = *min_step_length;
            let max_edges = rule.max_edges();

            let mut bbox = BBox::from_point(cond.arena.point(first).point());
            bbox.expand(cond.arena.point(second).point());
            let mut net_ids = BTreeSet::new();
            net_ids.insert(cond.arena.point(first).net_id);
            net_ids.insert(cond.arena.point(second).net_id);

            let mut edge_cnt: u32 = 1;
            let mut is_violation = false;

            // Walk outward from both endpoints: backward from the first,
            // forward from the second.
            for (start, backward) in [(first, true), (second, false)] {
                walk_chain(
                    cond,
                    store,
                    start,
                    backward,
                    min_step_length,
                    max_edges,
                    &mut edge_cnt,
                    &mut bbox,
                    &mut net_ids,
                    &mut is_violation,
                );
            }

            if is_violation {
                clean = false;
            }
        }

        clean
    }

    /// LEF58 refinement: fires only on asymmetric corner pairs. Each side
    /// (prev of the first point, next of the second) is inspected
    /// independently; both may emit for the same pair.
    fn check_min_step_lef58_segment(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
        first: PointId,
        second: PointId,
    ) -> bool {
        let mut clean = true;

        let corner_first = cond.arena.point(first).corner;
        let corner_second = cond.arena.point(second).corner;
        if corner_first == CornerType::None
            || corner_second == CornerType::None
            || corner_first == corner_second
        {
            return clean;
        }

        let step_edge_length = cond.arena.distance(first, second);
        for rule in self
            .rules
            .rules_above(cond.layer_id, RuleKind::MinStepLef58, step_edge_length)
        {
            let ConditionRule::MinStepLef58 {
                min_adjacent_length: Some(min_adjacent_length),
                ..
            } = rule
            else {
                continue;
            };
            let min_adjacent_length = *min_adjacent_length;

            if corner_first == CornerType::Convex {
                let outer = cond.arena.prev_endpoint(first);
                clean &= self.check_adjacent_side(
                    cond,
                    store,
                    first,
                    second,
                    outer,
                    min_adjacent_length,
                );
            }

            if corner_second == CornerType::Convex {
                let outer = cond.arena.next_endpoint(second);
                clean &= self.check_adjacent_side(
                    cond,
                    store,
                    first,
                    second,
                    outer,
                    min_adjacent_length,
                );
            }
        }

        clean
    }

    fn check_adjacent_side(
        &self,
        cond: &mut LayerConditions,
        store: &mut ViolationStore,
        first: PointId,
        second: PointId,
        outer: PointId,
        min_adjacent_length: i32,
    ) -> bool {
        let convex_end = if cond.arena.prev_endpoint(first) == outer {
            first
        } else {
            second
        };
        let adjacent_length = cond.arena.distance(convex_end, outer);
        if adjacent_length >= min_adjacent_length
            || cond.arena.point(outer).corner != CornerType::Concave
        {
            return true;
        }

        let mut bbox = BBox::from_point(cond.arena.point(first).point());
        bbox.expand(cond.arena.point(second).point());
        bbox.expand(cond.arena.point(outer).point());
        let net_ids: BTreeSet<i32> = [first, second, outer]
            .iter()
            .map(|&id| cond.arena.point(id).net_id)
            .collect();

        for id in [outer, first, second] {
            cond.set_checked(RuleKind::MinStep, id);
        }

        store.add(DrcViolation::rect(
            cond.layer_id,
            ViolationEnumType::MinStep,
            net_ids,
            bbox,
        ));
        false
    }
}

/// Walk the boundary from `start`, accumulating consecutive short edges.
/// Marks every visited point checked regardless of outcome, and emits
/// exactly one violation the moment the edge count exceeds `max_edges`.
#[allow(clippy::too_many_arguments)]
fn walk_chain(
    cond: &mut LayerConditions,
    store: &mut ViolationStore,
    start: PointId,
    backward: bool,
    min_step_length: i32,
    max_edges: u32,
    edge_cnt: &mut u32,
    bbox: &mut BBox,
    net_ids: &mut BTreeSet<i32>,
    is_violation: &mut bool,
) {
    let step = |cond: &LayerConditions, id: PointId| {
        if backward {
            cond.arena.prev_endpoint(id)
        } else {
            cond.arena.next_endpoint(id)
        }
    };

    cond.set_checked(RuleKind::MinStep, start);
    let mut current = start;
    let mut iter = step(cond, current);
    while !*is_violation && cond.arena.distance(current, iter) < min_step_length && iter != start {
        current = iter;
        iter = step(cond, current);
        *edge_cnt += 1;
        cond.set_checked(RuleKind::MinStep, current);

        let point = cond.arena.point(current);
        bbox.expand(point.point());
        net_ids.insert(point.net_id);

        if *edge_cnt > max_edges {
            *is_violation = true;
            store.add(DrcViolation::rect(
                cond.layer_id,
                ViolationEnumType::MinStep,
                net_ids.clone(),
                *bbox,
            ));
        }

        cond.set_checked(RuleKind::MinStep, iter);
    }
}
