use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use layerlint_core::{LayerId, LayerStack};
use layerlint_drc::ViolationMap;

/// JSON violation report consumed by downstream reporting and
/// feature-summary aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationReport {
    pub design: String,
    pub total: usize,
    /// Violation counts keyed by human-readable rule category name.
    pub counts: BTreeMap<String, usize>,
    /// Names of the layers that appear in the violations, when a
    /// technology layer stack was supplied.
    pub layer_names: BTreeMap<LayerId, String>,
    pub violations: ViolationMap,
}

impl ViolationReport {
    pub fn from_map(design: &str, violations: ViolationMap) -> Self {
        let counts = violations
            .iter()
            .map(|(t, list)| (t.name().to_string(), list.len()))
            .collect();
        let total = violations.values().map(Vec::len).sum();
        Self {
            design: design.to_string(),
            total,
            counts,
            layer_names: BTreeMap::new(),
            violations,
        }
    }

    /// Resolve the violated layers to technology layer names.
    pub fn with_layer_names(mut self, layers: &LayerStack) -> Self {
        self.layer_names = self
            .violations
            .values()
            .flatten()
            .filter_map(|v| {
                let id = v.layer_id();
                layers.get_layer(id).map(|l| (id, l.name.clone()))
            })
            .collect();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use layerlint_core::BBox;
    use layerlint_drc::{DrcViolation, ViolationEnumType, ViolationStore};

    #[test]
    fn test_report_json_round_trip() {
        let mut store = ViolationStore::new();
        store.add(DrcViolation::rect(
            1,
            ViolationEnumType::MinStep,
            BTreeSet::from([5]),
            BBox::new(0, 43, 3, 50),
        ));
        store.add(DrcViolation::rect(
            1,
            ViolationEnumType::JogToJog,
            BTreeSet::from([5, 9]),
            BBox::new(0, 0, 10, 10),
        ));

        let report = ViolationReport::from_map("adder_top", store.into_violation_map());
        assert_eq!(report.total, 2);
        assert_eq!(report.counts.get("MinStep"), Some(&1));
        assert_eq!(report.counts.get("JogToJog Spacing"), Some(&1));

        let json = report.to_json().unwrap();
        let parsed = ViolationReport::from_json(&json).unwrap();
        assert_eq!(parsed.total, report.total);
        assert_eq!(parsed.violations, report.violations);
    }

    #[test]
    fn test_layer_names_resolved_from_stack() {
        let mut stack = LayerStack::new();
        stack.add_layer(layerlint_core::Layer::new(1, "met1", 68, 20));
        stack.add_layer(layerlint_core::Layer::new(2, "met2", 69, 20));

        let mut store = ViolationStore::new();
        store.add(DrcViolation::rect(
            1,
            ViolationEnumType::MinStep,
            BTreeSet::from([5]),
            BBox::new(0, 0, 4, 4),
        ));

        let report = ViolationReport::from_map("adder_top", store.into_violation_map())
            .with_layer_names(&stack);
        assert_eq!(report.layer_names.get(&1).map(String::as_str), Some("met1"));
        assert!(!report.layer_names.contains_key(&2));
    }
}
