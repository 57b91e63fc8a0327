use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use layerlint_core::{BBox, LayerId};

/// Closed enumeration of rule categories a violation can belong to.
///
/// Discriminants are stable and double as the DATATYPE integer in the
/// diagnostic export, so they must never be reordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ViolationEnumType {
    Area = 1,
    AreaEnclosed = 2,
    Short = 3,
    DefaultSpacing = 4,
    PRLSpacing = 5,
    JogToJog = 6,
    EOL = 7,
    Width = 8,
    MinStep = 9,
    Notch = 10,
    Connectivity = 11,
    CornerFill = 12,
}

impl ViolationEnumType {
    pub fn name(&self) -> &'static str {
        match self {
            ViolationEnumType::Area => "Minimum Area",
            ViolationEnumType::AreaEnclosed => "Enclosed Area",
            ViolationEnumType::Short => "Metal Short",
            ViolationEnumType::DefaultSpacing => "Default Spacing",
            ViolationEnumType::PRLSpacing => "Metal Parallel Run Length Spacing",
            ViolationEnumType::JogToJog => "JogToJog Spacing",
            ViolationEnumType::EOL => "Metal EOL Spacing",
            ViolationEnumType::Width => "Wire Width",
            ViolationEnumType::MinStep => "MinStep",
            ViolationEnumType::Notch => "Metal Notch Spacing",
            ViolationEnumType::Connectivity => "Connectivity",
            ViolationEnumType::CornerFill => "Corner Fill",
        }
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => ViolationEnumType::Area,
            2 => ViolationEnumType::AreaEnclosed,
            3 => ViolationEnumType::Short,
            4 => ViolationEnumType::DefaultSpacing,
            5 => ViolationEnumType::PRLSpacing,
            6 => ViolationEnumType::JogToJog,
            7 => ViolationEnumType::EOL,
            8 => ViolationEnumType::Width,
            9 => ViolationEnumType::MinStep,
            10 => ViolationEnumType::Notch,
            11 => ViolationEnumType::Connectivity,
            12 => ViolationEnumType::CornerFill,
            _ => return None,
        })
    }
}

impl fmt::Display for ViolationEnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rectangular violation region with net attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcViolationRect {
    pub layer_id: LayerId,
    pub violation_type: ViolationEnumType,
    /// Identities of every net contributing a point to the violation.
    pub net_ids: BTreeSet<i32>,
    pub llx: i32,
    pub lly: i32,
    pub urx: i32,
    pub ury: i32,
}

impl DrcViolationRect {
    pub fn bbox(&self) -> BBox {
        BBox::new(self.llx, self.lly, self.urx, self.ury)
    }
}

/// A located, typed rule violation. Polymorphic over geometry kind; the
/// rectangle variant is the one every checker in this crate produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrcViolation {
    Rect(DrcViolationRect),
}

impl DrcViolation {
    pub fn rect(
        layer_id: LayerId,
        violation_type: ViolationEnumType,
        net_ids: BTreeSet<i32>,
        bbox: BBox,
    ) -> Self {
        DrcViolation::Rect(DrcViolationRect {
            layer_id,
            violation_type,
            net_ids,
            llx: bbox.llx,
            lly: bbox.lly,
            urx: bbox.urx,
            ury: bbox.ury,
        })
    }

    pub fn layer_id(&self) -> LayerId {
        match self {
            DrcViolation::Rect(r) => r.layer_id,
        }
    }

    pub fn violation_type(&self) -> ViolationEnumType {
        match self {
            DrcViolation::Rect(r) => r.violation_type,
        }
    }

    pub fn net_ids(&self) -> &BTreeSet<i32> {
        match self {
            DrcViolation::Rect(r) => &r.net_ids,
        }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            DrcViolation::Rect(r) => r.bbox(),
        }
    }
}

/// Violation map handed back to the caller: per-type ordered lists.
pub type ViolationMap = BTreeMap<ViolationEnumType, Vec<DrcViolation>>;

/// Type-indexed accumulation of violations.
///
/// `add` appends in insertion order and never deduplicates; duplicate
/// suppression happens upstream through the per-point checked flags.
/// The store is cleared only when a new check pass begins.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ViolationStore {
    violations: ViolationMap,
}

impl ViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: DrcViolation) {
        self.violations
            .entry(violation.violation_type())
            .or_default()
            .push(violation);
    }

    pub fn get(&self, violation_type: ViolationEnumType) -> &[DrcViolation] {
        self.violations
            .get(&violation_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append every violation of `other`, preserving its insertion order.
    pub fn merge(&mut self, other: ViolationStore) {
        for (violation_type, list) in other.violations {
            self.violations
                .entry(violation_type)
                .or_default()
                .extend(list);
        }
    }

    pub fn violation_map(&self) -> &ViolationMap {
        &self.violations
    }

    pub fn into_violation_map(self) -> ViolationMap {
        self.violations
    }

    pub fn total(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        self.violations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(t: ViolationEnumType, llx: i32) -> DrcViolation {
        DrcViolation::rect(1, t, BTreeSet::from([0]), BBox::new(llx, 0, llx + 5, 5))
    }

    #[test]
    fn test_type_roundtrip() {
        for v in 1..=12 {
            let t = ViolationEnumType::from_u32(v).unwrap();
            assert_eq!(t.as_u32(), v);
        }
        assert!(ViolationEnumType::from_u32(0).is_none());
        assert!(ViolationEnumType::from_u32(13).is_none());
    }

    #[test]
    fn test_store_preserves_insertion_order_and_duplicates() {
        let mut store = ViolationStore::new();
        store.add(violation(ViolationEnumType::MinStep, 0));
        store.add(violation(ViolationEnumType::MinStep, 10));
        store.add(violation(ViolationEnumType::MinStep, 0));
        let list = store.get(ViolationEnumType::MinStep);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], list[2]);
        assert!(store.get(ViolationEnumType::JogToJog).is_empty());
    }

    #[test]
    fn test_merge_appends() {
        let mut a = ViolationStore::new();
        a.add(violation(ViolationEnumType::MinStep, 0));
        let mut b = ViolationStore::new();
        b.add(violation(ViolationEnumType::MinStep, 10));
        b.add(violation(ViolationEnumType::JogToJog, 20));
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.get(ViolationEnumType::MinStep).len(), 2);
    }
}
