//! # LayerLint Core
//!
//! Integer-DBU geometry primitives, the arena-backed boundary-point model
//! with corner classification, technology layers, and an R-tree spatial
//! index. Everything downstream of the external layout collaborator and
//! upstream of the rule checkers lives here.

pub mod boundary;
pub mod geometry;
pub mod layer;
pub mod spatial;

pub use boundary::{BoundaryArena, BoundaryError, BoundaryPoint, CornerType, PointId};
pub use geometry::{BBox, Point, Rect, WireSegment};
pub use layer::{Layer, LayerId, LayerStack};
