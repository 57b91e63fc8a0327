use thiserror::Error;

use crate::rules::RuleTableError;

/// Pass-abort conditions. Per-candidate problems (non-adjacent pairs,
/// missing rule tables, malformed shapes) are recovered locally and never
/// surface here.
#[derive(Debug, Error)]
pub enum DrcError {
    #[error("rule repository is empty; cannot start a check pass")]
    EmptyRuleRepository,

    #[error(transparent)]
    RuleTable(#[from] RuleTableError),
}
