//! # LayerLint DRC
//!
//! Condition-based design-rule violation detection. The engine walks
//! arena-backed boundary cycles, looks rules up in ascending-threshold
//! tables, recognizes multi-edge patterns with a generic bit-sequence
//! state machine, and accumulates typed, located violations per layer.
//!
//! Entry point is [`manager::DrcManager`]: feed it full-layout geometry
//! (or incremental routing geometry) and read back the violation map.

pub mod checker_jog;
pub mod checker_step;
pub mod condition;
pub mod error;
pub mod manager;
pub mod rules;
pub mod sequence;
pub mod violation;

pub use checker_jog::JogChecker;
pub use checker_step::MinStepChecker;
pub use condition::LayerConditions;
pub use error::DrcError;
pub use manager::{DrcCheckKind, DrcManager, LayoutPolygon, PassStage, ENV_NET_ID};
pub use rules::{ConditionRule, RuleKind, RuleTable, RuleTableBuilder, RuleTableError};
pub use sequence::{SequenceClassifier, SequenceState};
pub use violation::{DrcViolation, DrcViolationRect, ViolationEnumType, ViolationMap, ViolationStore};
