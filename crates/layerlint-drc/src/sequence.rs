use serde::{Deserialize, Serialize};

/// Edge-type bit-flags fed to the sequence classifier while walking a
/// boundary cycle. One edge may carry several flags.
pub mod edge_flags {
    /// Edge shorter than the rule's width threshold.
    pub const SHORT: u64 = 1 << 0;
    /// Edge at or above the rule's width threshold.
    pub const LONG: u64 = 1 << 1;
    pub const HORIZONTAL: u64 = 1 << 2;
    pub const VERTICAL: u64 = 1 << 3;
    /// Corner type at the edge's starting point.
    pub const FROM_CONVEX: u64 = 1 << 4;
    pub const FROM_CONCAVE: u64 = 1 << 5;
}

/// State of a multi-edge pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceState {
    None,
    Trigger,
    Recording,
    Success,
    Fail,
}

impl SequenceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SequenceState::Success | SequenceState::Fail)
    }
}

/// Pure transition function over (state, edge flags). Terminal states
/// absorb further input.
pub fn transition(
    state: SequenceState,
    flags: u64,
    trigger_mask: u64,
    middle_mask: u64,
    success_mask: u64,
) -> SequenceState {
    match state {
        SequenceState::None => {
            if flags & trigger_mask != 0 {
                SequenceState::Trigger
            } else {
                SequenceState::Fail
            }
        }
        SequenceState::Trigger => {
            if flags & middle_mask != 0 {
                SequenceState::Recording
            } else {
                SequenceState::Fail
            }
        }
        SequenceState::Recording => {
            if flags & success_mask != 0 {
                SequenceState::Success
            } else if flags & middle_mask != 0 {
                SequenceState::Recording
            } else {
                SequenceState::Fail
            }
        }
        SequenceState::Success | SequenceState::Fail => state,
    }
}

/// Generic finite-state machine recognizing multi-edge violation shapes:
/// a trigger edge, one or more qualifying middle edges, then a success
/// edge. Parameterized by three acceptance masks over edge-type flags.
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    trigger_mask: u64,
    middle_mask: u64,
    success_mask: u64,
    /// Optional measured-length gate for [`SequenceClassifier::apply_value`].
    filter_value: Option<i32>,
    state: SequenceState,
}

impl SequenceClassifier {
    pub fn new(trigger_mask: u64, middle_mask: u64, success_mask: u64) -> Self {
        Self {
            trigger_mask,
            middle_mask,
            success_mask,
            filter_value: None,
            state: SequenceState::None,
        }
    }

    pub fn with_filter_value(mut self, filter_value: i32) -> Self {
        self.filter_value = Some(filter_value);
        self
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SequenceState::None;
    }

    /// Feed the flags of the next edge encountered on the walk.
    pub fn apply(&mut self, flags: u64) -> SequenceState {
        self.state = transition(
            self.state,
            flags,
            self.trigger_mask,
            self.middle_mask,
            self.success_mask,
        );
        self.state
    }

    /// Rule-specific refinement: reject a match whose measured length
    /// reaches the filter distance. No-op without a configured filter.
    pub fn apply_value(&mut self, measured: i32) -> SequenceState {
        if let Some(filter) = self.filter_value {
            if measured >= filter {
                self.state = SequenceState::Fail;
            }
        }
        self.state
    }
}
