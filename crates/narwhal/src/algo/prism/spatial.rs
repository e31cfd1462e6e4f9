use rstar::{AABB, RTree, RTreeObject};

use crate::geom::{Point, Size};

#[derive(Debug, Clone, Copy)]
struct NodeBox {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for NodeBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// R-tree over node boxes, for the all-pairs sweep once the triangulation finds no overlaps.
pub(crate) struct BoxIndex {
    tree: RTree<NodeBox>,
    boxes: Vec<NodeBox>,
}

impl BoxIndex {
    pub(crate) fn new(positions: &[Point], sizes: &[Size]) -> Self {
        let boxes: Vec<NodeBox> = positions
            .iter()
            .zip(sizes)
            .enumerate()
            .map(|(index, (p, s))| {
                let (hw, hh) = (s.width / 2.0, s.height / 2.0);
                NodeBox {
                    index,
                    aabb: AABB::from_corners([p.x - hw, p.y - hh], [p.x + hw, p.y + hh]),
                }
            })
            .collect();
        let tree = RTree::bulk_load(boxes.clone());
        Self { tree, boxes }
    }

    /// Calls `f(a, b)` with `a < b` once for every pair of boxes that intersect or touch.
    pub(crate) fn for_each_touching_pair(&self, mut f: impl FnMut(usize, usize)) {
        for b in &self.boxes {
            for other in self.tree.locate_in_envelope_intersecting(&b.aabb) {
                if other.index > b.index {
                    f(b.index, other.index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoxIndex;
    use crate::geom::{point, size};

    #[test]
    fn reports_each_touching_pair_once_with_the_smaller_index_first() {
        let positions = [point(0.0, 0.0), point(1.5, 0.0), point(10.0, 10.0), point(0.5, 0.5)];
        let sizes = [size(2.0, 2.0); 4];
        let mut pairs = Vec::new();
        BoxIndex::new(&positions, &sizes).for_each_touching_pair(|a, b| pairs.push((a, b)));
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (0, 3), (1, 3)]);
    }
}
