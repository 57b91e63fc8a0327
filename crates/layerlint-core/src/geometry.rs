use serde::{Deserialize, Serialize};

/// A 2D point in integer database units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance. Boundaries are rectilinear, so for two points on
    /// the same axis-aligned edge this equals the edge length.
    pub fn manhattan_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An axis-aligned bounding box in database units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub llx: i32,
    pub lly: i32,
    pub urx: i32,
    pub ury: i32,
}

impl BBox {
    pub fn new(llx: i32, lly: i32, urx: i32, ury: i32) -> Self {
        Self {
            llx: llx.min(urx),
            lly: lly.min(ury),
            urx: llx.max(urx),
            ury: lly.max(ury),
        }
    }

    /// Degenerate box covering a single point; grow it with [`BBox::expand`].
    pub fn from_point(p: Point) -> Self {
        Self {
            llx: p.x,
            lly: p.y,
            urx: p.x,
            ury: p.y,
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self::from_point(*first);
        for p in rest {
            bbox.expand(*p);
        }
        Some(bbox)
    }

    /// Grow the box to cover `p`.
    pub fn expand(&mut self, p: Point) {
        self.llx = self.llx.min(p.x);
        self.lly = self.lly.min(p.y);
        self.urx = self.urx.max(p.x);
        self.ury = self.ury.max(p.y);
    }

    pub fn width(&self) -> i32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> i32 {
        self.ury - self.lly
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.llx && p.x <= self.urx && p.y >= self.lly && p.y <= self.ury
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.llx <= other.urx
            && self.urx >= other.llx
            && self.lly <= other.ury
            && self.ury >= other.lly
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            llx: self.llx.min(other.llx),
            lly: self.lly.min(other.lly),
            urx: self.urx.max(other.urx),
            ury: self.ury.max(other.ury),
        }
    }
}

/// A layer-tagged rectangle, the unit of environment/pin geometry handed to
/// the checker by the layout collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub layer_id: crate::LayerId,
    pub llx: i32,
    pub lly: i32,
    pub urx: i32,
    pub ury: i32,
}

impl Rect {
    pub fn new(layer_id: crate::LayerId, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            layer_id,
            llx: x1.min(x2),
            lly: y1.min(y2),
            urx: x1.max(x2),
            ury: y1.max(y2),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.llx, self.lly, self.urx, self.ury)
    }

    pub fn width(&self) -> i32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> i32 {
        self.ury - self.lly
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Counter-clockwise outline starting at the lower-left corner.
    pub fn outline(&self) -> [Point; 4] {
        [
            Point::new(self.llx, self.lly),
            Point::new(self.urx, self.lly),
            Point::new(self.urx, self.ury),
            Point::new(self.llx, self.ury),
        ]
    }
}

/// A routed wire segment: axis-aligned centerline plus width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSegment {
    pub layer_id: crate::LayerId,
    pub start: Point,
    pub end: Point,
    pub width: i32,
}

impl WireSegment {
    pub fn new(layer_id: crate::LayerId, start: Point, end: Point, width: i32) -> Self {
        Self {
            layer_id,
            start,
            end,
            width,
        }
    }

    /// Expand the centerline into the wire's covering rectangle.
    pub fn to_rect(&self) -> Rect {
        let half = self.width / 2;
        Rect::new(
            self.layer_id,
            self.start.x.min(self.end.x) - half,
            self.start.y.min(self.end.y) - half,
            self.start.x.max(self.end.x) + half,
            self.start.y.max(self.end.y) + half,
        )
    }

    pub fn length(&self) -> i32 {
        self.start.manhattan_distance(&self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.manhattan_distance(&b), 7);
        assert_eq!(a.manhattan_distance(&Point::new(0, 5)), 5);
    }

    #[test]
    fn test_bbox_expand() {
        let mut bb = BBox::from_point(Point::new(10, 10));
        bb.expand(Point::new(5, 20));
        bb.expand(Point::new(15, 0));
        assert_eq!(bb, BBox::new(5, 0, 15, 20));
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BBox::new(0, 0, 10, 10);
        let b = BBox::new(5, 5, 15, 15);
        let c = BBox::new(20, 20, 30, 30);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(0, 10, 5, 0, 0);
        assert_eq!((r.llx, r.lly, r.urx, r.ury), (0, 0, 10, 5));
        assert_eq!(r.area(), 50);
    }

    #[test]
    fn test_wire_segment_to_rect() {
        let seg = WireSegment::new(1, Point::new(0, 0), Point::new(100, 0), 20);
        let r = seg.to_rect();
        assert_eq!((r.llx, r.lly, r.urx, r.ury), (-10, -10, 110, 10));
    }
}
