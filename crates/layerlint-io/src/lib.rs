//! # LayerLint I/O
//!
//! Result serialization for the DRC engine: the bit-exact diagnostic
//! GDS-text stream used by external polygon-diff tooling, and the JSON
//! violation report consumed by downstream aggregation.

pub mod diagnostic;
pub mod report;

pub use diagnostic::{DiagnosticError, LayerTypeRects};
pub use report::ViolationReport;
