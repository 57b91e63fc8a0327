use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Rect};
use crate::LayerId;

/// An entry in the R-tree spatial index: one layer-tagged shape with its
/// owning net.
#[derive(Debug, Clone)]
pub struct ShapeEntry {
    pub layer_id: LayerId,
    pub net_id: i32,
    pub bbox: BBox,
}

impl ShapeEntry {
    pub fn from_rect(net_id: i32, rect: &Rect) -> Self {
        Self {
            layer_id: rect.layer_id,
            net_id,
            bbox: rect.bbox(),
        }
    }
}

impl RTreeObject for ShapeEntry {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bbox.llx, self.bbox.lly], [self.bbox.urx, self.bbox.ury])
    }
}

/// Spatial index over ingested shapes, used to scope incremental checks to
/// the neighborhood of the supplied geometry.
pub struct SpatialIndex {
    tree: RTree<ShapeEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn build(entries: Vec<ShapeEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, entry: ShapeEntry) {
        self.tree.insert(entry);
    }

    /// All entries intersecting `region`, regardless of layer.
    pub fn query_region(&self, region: &BBox) -> Vec<&ShapeEntry> {
        let envelope = AABB::from_corners([region.llx, region.lly], [region.urx, region.ury]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    /// Entries on `layer_id` intersecting `region`.
    pub fn query_layer_region(&self, layer_id: LayerId, region: &BBox) -> Vec<&ShapeEntry> {
        self.query_region(region)
            .into_iter()
            .filter(|e| e.layer_id == layer_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_region_query() {
        let entries = vec![
            ShapeEntry::from_rect(1, &Rect::new(1, 0, 0, 10, 10)),
            ShapeEntry::from_rect(2, &Rect::new(1, 20, 20, 30, 30)),
            ShapeEntry::from_rect(3, &Rect::new(2, 0, 0, 10, 10)),
        ];
        let index = SpatialIndex::build(entries);
        assert_eq!(index.len(), 3);

        let region = BBox::new(-5, -5, 15, 15);
        assert_eq!(index.query_region(&region).len(), 2);

        let hits = index.query_layer_region(1, &region);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].net_id, 1);
    }
}
