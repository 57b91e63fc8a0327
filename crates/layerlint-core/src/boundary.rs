use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Rect};

/// Index of a point inside a [`BoundaryArena`]. Stable for the lifetime of
/// the arena; the arena's lifetime brackets a whole check pass.
pub type PointId = usize;

/// Classification of a boundary vertex by its two adjacent edge directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerType {
    /// Collinear vertex, not a corner.
    None,
    /// Corner turning outward (material on the inside of the turn).
    Convex,
    /// Corner turning inward.
    Concave,
}

/// A node on a rectilinear polygon boundary cycle.
///
/// Points do not own their neighbors; `next`/`prev` are arena indices and
/// the arena owns every point. Topology is immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub x: i32,
    pub y: i32,
    /// Identity shared by all points of the same net/shape, used for
    /// violation net attribution.
    pub net_id: i32,
    pub corner: CornerType,
    next: PointId,
    prev: PointId,
}

impl BoundaryPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn distance(&self, other: &BoundaryPoint) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("boundary needs at least 4 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("boundary edge ({0}, {1}) -> ({2}, {3}) is not axis-aligned")]
    NotRectilinear(i32, i32, i32, i32),

    #[error("boundary has a zero-length edge at ({0}, {1})")]
    ZeroLengthEdge(i32, i32),
}

/// Arena of boundary points forming disjoint cycles, one per ingested shape.
///
/// Every point belongs to exactly one cycle, and walking `next_endpoint`
/// (or `prev_endpoint`) from any point visits each point of its cycle
/// exactly once before returning to the start.
#[derive(Debug, Default)]
pub struct BoundaryArena {
    points: Vec<BoundaryPoint>,
    /// (first point id, point count) per accepted cycle.
    loops: Vec<(PointId, usize)>,
}

impl BoundaryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one closed rectilinear polygon boundary as a new cycle.
    ///
    /// `vertices` lists the corners in order; a trailing repeat of the first
    /// vertex is accepted and dropped. A malformed shape is rejected without
    /// touching the arena, so earlier cycles stay usable.
    pub fn add_polygon(&mut self, net_id: i32, vertices: &[Point]) -> Result<PointId, BoundaryError> {
        let mut verts = vertices;
        if verts.len() > 1 && verts.first() == verts.last() {
            verts = &verts[..verts.len() - 1];
        }
        if verts.len() < 4 {
            return Err(BoundaryError::TooFewVertices(verts.len()));
        }
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            if a == b {
                return Err(BoundaryError::ZeroLengthEdge(a.x, a.y));
            }
            if a.x != b.x && a.y != b.y {
                return Err(BoundaryError::NotRectilinear(a.x, a.y, b.x, b.y));
            }
        }

        let base = self.points.len();
        let n = verts.len();
        let winding = signed_area_doubled(verts).signum();
        for (i, v) in verts.iter().enumerate() {
            let prev = verts[(i + n - 1) % n];
            let next = verts[(i + 1) % n];
            self.points.push(BoundaryPoint {
                x: v.x,
                y: v.y,
                net_id,
                corner: classify_corner(prev, *v, next, winding),
                next: base + (i + 1) % n,
                prev: base + (i + n - 1) % n,
            });
        }
        self.loops.push((base, n));
        Ok(base)
    }

    /// Convenience for the common rectangular shape.
    pub fn add_rect(&mut self, net_id: i32, rect: &Rect) -> Result<PointId, BoundaryError> {
        self.add_polygon(net_id, &rect.outline())
    }

    /// Add a polygon, logging and skipping it when malformed. Returns the
    /// first point id of the accepted cycle.
    pub fn add_polygon_lossy(&mut self, net_id: i32, vertices: &[Point]) -> Option<PointId> {
        match self.add_polygon(net_id, vertices) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!("rejecting malformed boundary for net {net_id}: {err}");
                None
            }
        }
    }

    pub fn point(&self, id: PointId) -> &BoundaryPoint {
        &self.points[id]
    }

    pub fn next_endpoint(&self, id: PointId) -> PointId {
        self.points[id].next
    }

    pub fn prev_endpoint(&self, id: PointId) -> PointId {
        self.points[id].prev
    }

    /// Manhattan distance between two arena points.
    pub fn distance(&self, a: PointId, b: PointId) -> i32 {
        self.points[a].distance(&self.points[b])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Iterate the point ids of every cycle, each in boundary order.
    pub fn loops(&self) -> impl Iterator<Item = std::ops::Range<PointId>> + '_ {
        self.loops.iter().map(|&(start, n)| start..start + n)
    }

    /// Candidate edges: consecutive point pairs whose edge length is below
    /// `max_length`. Iteration order is loop order then boundary order, so
    /// downstream checked-flag bookkeeping is deterministic.
    pub fn short_edges(&self, max_length: i32) -> Vec<(PointId, PointId)> {
        let mut pairs = Vec::new();
        for range in self.loops() {
            for id in range {
                let next = self.points[id].next;
                if self.distance(id, next) < max_length {
                    pairs.push((id, next));
                }
            }
        }
        pairs
    }
}

/// Twice the signed area of the ring (shoelace); positive for CCW winding.
fn signed_area_doubled(verts: &[Point]) -> i64 {
    let mut acc: i64 = 0;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        acc += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    acc
}

fn classify_corner(prev: Point, at: Point, next: Point, winding: i64) -> CornerType {
    let ax = (at.x - prev.x) as i64;
    let ay = (at.y - prev.y) as i64;
    let bx = (next.x - at.x) as i64;
    let by = (next.y - at.y) as i64;
    let cross = ax * by - ay * bx;
    if cross == 0 {
        CornerType::None
    } else if cross.signum() == winding {
        CornerType::Convex
    } else {
        CornerType::Concave
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_verts() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ]
    }

    #[test]
    fn test_cycle_traversal_visits_all_points_once() {
        let mut arena = BoundaryArena::new();
        let start = arena.add_polygon(7, &rect_verts()).unwrap();
        let mut seen = vec![start];
        let mut id = arena.next_endpoint(start);
        while id != start {
            seen.push(id);
            id = arena.next_endpoint(id);
        }
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|&p| arena.point(p).net_id == 7));
    }

    #[test]
    fn test_two_way_consistency() {
        let mut arena = BoundaryArena::new();
        let start = arena.add_polygon(1, &rect_verts()).unwrap();
        for id in start..start + 4 {
            assert_eq!(arena.prev_endpoint(arena.next_endpoint(id)), id);
            assert_eq!(arena.next_endpoint(arena.prev_endpoint(id)), id);
        }
    }

    #[test]
    fn test_rect_corners_all_convex() {
        let mut arena = BoundaryArena::new();
        let start = arena.add_polygon(1, &rect_verts()).unwrap();
        for id in start..start + 4 {
            assert_eq!(arena.point(id).corner, CornerType::Convex);
        }
    }

    #[test]
    fn test_l_shape_has_one_concave_corner() {
        // L-shape: the notch vertex at (5, 5) is the only concave corner.
        let verts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(5, 5),
            Point::new(5, 10),
            Point::new(0, 10),
        ];
        let mut arena = BoundaryArena::new();
        let start = arena.add_polygon(1, &verts).unwrap();
        let corners: Vec<CornerType> = (start..start + 6).map(|id| arena.point(id).corner).collect();
        assert_eq!(
            corners.iter().filter(|&&c| c == CornerType::Concave).count(),
            1
        );
        assert_eq!(arena.point(start + 3).corner, CornerType::Concave);
    }

    #[test]
    fn test_clockwise_winding_classified_the_same() {
        let mut ccw = BoundaryArena::new();
        let mut cw = BoundaryArena::new();
        let mut reversed = rect_verts();
        reversed.reverse();
        let a = ccw.add_polygon(1, &rect_verts()).unwrap();
        let b = cw.add_polygon(1, &reversed).unwrap();
        for i in 0..4 {
            assert_eq!(ccw.point(a + i).corner, cw.point(b + i).corner);
        }
    }

    #[test]
    fn test_malformed_shape_rejected_rest_usable() {
        let mut arena = BoundaryArena::new();
        arena.add_polygon(1, &rect_verts()).unwrap();
        let diagonal = vec![
            Point::new(0, 0),
            Point::new(10, 10),
            Point::new(10, 20),
            Point::new(0, 20),
        ];
        assert!(matches!(
            arena.add_polygon(2, &diagonal),
            Err(BoundaryError::NotRectilinear(..))
        ));
        assert!(arena.add_polygon_lossy(2, &diagonal).is_none());
        assert_eq!(arena.loop_count(), 1);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_closed_ring_input_accepted() {
        let mut closed = rect_verts();
        closed.push(closed[0]);
        let mut arena = BoundaryArena::new();
        arena.add_polygon(1, &closed).unwrap();
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_short_edges_deterministic_order() {
        let verts = vec![
            Point::new(0, 0),
            Point::new(40, 0),
            Point::new(40, 3),
            Point::new(38, 3),
            Point::new(38, 10),
            Point::new(0, 10),
        ];
        let mut arena = BoundaryArena::new();
        let start = arena.add_polygon(1, &verts).unwrap();
        let pairs = arena.short_edges(5);
        assert_eq!(pairs, vec![(start + 1, start + 2), (start + 2, start + 3)]);
    }
}
