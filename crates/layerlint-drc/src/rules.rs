use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use layerlint_core::LayerId;

/// Rule families known to the condition engine. Used as the namespace key
/// for rule tables, candidate lists, and checked flags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RuleKind {
    MinStep,
    MinStepLef58,
    JogToJog,
}

/// A single layer-specific design rule with its scalars.
///
/// Rules are of the form "violate if the measured length is below the
/// rule's threshold", so the table lookup is "every rule whose threshold
/// strictly exceeds the measured length".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionRule {
    MinStep {
        min_step_length: i32,
        /// Maximum number of consecutive short edges tolerated; absent
        /// means 1.
        max_edges: Option<u32>,
    },
    MinStepLef58 {
        min_step_length: i32,
        /// LEF58 refinement: minimum length of the edge adjacent to an
        /// asymmetric convex/concave corner pair. The refinement is
        /// inactive when absent.
        min_adjacent_length: Option<i32>,
    },
    JogToJog {
        /// Edges shorter than this are jog segments.
        jog_width: i32,
        /// Minimum allowed span of a recognized jog pattern.
        jog_to_jog_spacing: i32,
    },
}

impl ConditionRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            ConditionRule::MinStep { .. } => RuleKind::MinStep,
            ConditionRule::MinStepLef58 { .. } => RuleKind::MinStepLef58,
            ConditionRule::JogToJog { .. } => RuleKind::JogToJog,
        }
    }

    /// Table key: the measured-length threshold below which the rule fires.
    pub fn threshold(&self) -> i32 {
        match self {
            ConditionRule::MinStep { min_step_length, .. } => *min_step_length,
            ConditionRule::MinStepLef58 { min_step_length, .. } => *min_step_length,
            ConditionRule::JogToJog { jog_width, .. } => *jog_width,
        }
    }

    pub fn max_edges(&self) -> u32 {
        match self {
            ConditionRule::MinStep { max_edges, .. } => max_edges.unwrap_or(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("rule threshold must be positive, got {threshold} on layer {layer_id}")]
    NonPositiveThreshold { layer_id: LayerId, threshold: i32 },
}

type KindTables = BTreeMap<RuleKind, BTreeMap<i32, Vec<ConditionRule>>>;

/// Per-layer, per-kind threshold tables. Built once per technology at
/// initialization, read-only afterwards and shared across all checkers.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    layers: BTreeMap<LayerId, KindTables>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    /// Every rule on `layer_id`/`kind` whose threshold strictly exceeds
    /// `measured_length`, in ascending threshold order. A measured length
    /// equal to a threshold does not violate. A missing table means the
    /// rule is inactive, never an error.
    pub fn rules_above(
        &self,
        layer_id: LayerId,
        kind: RuleKind,
        measured_length: i32,
    ) -> Vec<&ConditionRule> {
        let Some(table) = self.layers.get(&layer_id).and_then(|k| k.get(&kind)) else {
            return Vec::new();
        };
        table
            .range((Bound::Excluded(measured_length), Bound::Unbounded))
            .flat_map(|(_, rules)| rules.iter())
            .collect()
    }

    /// Largest threshold registered for `layer_id`/`kind`; edges at or
    /// above it can never violate, which bounds candidate gathering.
    pub fn max_threshold(&self, layer_id: LayerId, kind: RuleKind) -> Option<i32> {
        self.layers
            .get(&layer_id)?
            .get(&kind)?
            .keys()
            .next_back()
            .copied()
    }

    pub fn has_rules(&self, layer_id: LayerId, kind: RuleKind) -> bool {
        self.max_threshold(layer_id, kind).is_some()
    }

    /// Layers that carry at least one rule, ascending.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Builder validating the table invariants: positive thresholds, strictly
/// increasing per table (inherent to the map), non-empty rule lists
/// (inherent to insertion).
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    layers: BTreeMap<LayerId, KindTables>,
}

impl RuleTableBuilder {
    pub fn add_rule(
        mut self,
        layer_id: LayerId,
        rule: ConditionRule,
    ) -> Result<Self, RuleTableError> {
        let threshold = rule.threshold();
        if threshold <= 0 {
            return Err(RuleTableError::NonPositiveThreshold { layer_id, threshold });
        }
        self.layers
            .entry(layer_id)
            .or_default()
            .entry(rule.kind())
            .or_default()
            .entry(threshold)
            .or_default()
            .push(rule);
        Ok(self)
    }

    pub fn build(self) -> RuleTable {
        RuleTable { layers: self.layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::builder()
            .add_rule(
                1,
                ConditionRule::MinStep {
                    min_step_length: 10,
                    max_edges: Some(2),
                },
            )
            .unwrap()
            .add_rule(
                1,
                ConditionRule::MinStep {
                    min_step_length: 25,
                    max_edges: None,
                },
            )
            .unwrap()
            .build()
    }

    #[test]
    fn test_strictly_greater_threshold() {
        let table = table();
        // 9 violates both tables' thresholds (10 and 25).
        assert_eq!(table.rules_above(1, RuleKind::MinStep, 9).len(), 2);
        // Ties do not violate: 10 only matches the 25 entry.
        let at_ten = table.rules_above(1, RuleKind::MinStep, 10);
        assert_eq!(at_ten.len(), 1);
        assert_eq!(at_ten[0].threshold(), 25);
        assert!(table.rules_above(1, RuleKind::MinStep, 25).is_empty());
    }

    #[test]
    fn test_ascending_order() {
        let thresholds: Vec<i32> = table()
            .rules_above(1, RuleKind::MinStep, 0)
            .iter()
            .map(|r| r.threshold())
            .collect();
        assert_eq!(thresholds, vec![10, 25]);
    }

    #[test]
    fn test_missing_table_is_inactive() {
        let table = table();
        assert!(table.rules_above(2, RuleKind::MinStep, 0).is_empty());
        assert!(table.rules_above(1, RuleKind::JogToJog, 0).is_empty());
        assert!(!table.has_rules(1, RuleKind::MinStepLef58));
    }

    #[test]
    fn test_max_threshold() {
        assert_eq!(table().max_threshold(1, RuleKind::MinStep), Some(25));
    }

    #[test]
    fn test_builder_rejects_non_positive_threshold() {
        let err = RuleTable::builder().add_rule(
            1,
            ConditionRule::MinStep {
                min_step_length: 0,
                max_edges: None,
            },
        );
        assert_eq!(
            err.unwrap_err(),
            RuleTableError::NonPositiveThreshold {
                layer_id: 1,
                threshold: 0
            }
        );
    }

    #[test]
    fn test_default_max_edges() {
        let rule = ConditionRule::MinStep {
            min_step_length: 10,
            max_edges: None,
        };
        assert_eq!(rule.max_edges(), 1);
    }
}
