use rustc_hash::FxHashSet;

use super::spatial::BoxIndex;
use super::triangulation::delaunay_edges;
use crate::error::Result;
use crate::geom::{Point, Size};

/// Largest expansion applied to an overlapping pair in one iteration.
pub const EXPAND_MAX: f64 = 1.5;
/// Expansion of a pair that does not overlap.
pub const EXPAND_MIN: f64 = 1.0;
/// Smallest expansion of a pair that does overlap, so progress never stalls at `t = 1 + tiny`.
pub const MIN_OVERLAP_EXPANSION: f64 = 1.001;

const MACHINE_ACCURACY: f64 = 1.0e-16;

/// A pair of nodes with the distance at which their boxes would stop overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityEdge {
    /// Smaller node index.
    pub a: usize,
    /// Larger node index.
    pub b: usize,
    pub desired_distance: f64,
    /// Overlap factor `t`, in `[EXPAND_MIN, EXPAND_MAX]`.
    pub overlap_factor: f64,
}

impl ProximityEdge {
    pub fn is_overlap(&self) -> bool {
        self.overlap_factor > EXPAND_MIN
    }
}

/// Overlap factor `t` of two boxes: scaling their center distance by `t` makes them just touch.
///
/// `t` is clamped to `[EXPAND_MIN, EXPAND_MAX]`, and any overlap is bumped to at least
/// [`MIN_OVERLAP_EXPANSION`]. Coincident centers count as a maximal overlap unless one of the
/// combined extents is empty. Returns `(t * distance, t)`, with the desired distance of a
/// coincident pair being the smaller combined half-extent.
pub fn ideal_distance(p1: Point, p2: Point, s1: Size, s2: Size) -> (f64, f64) {
    let dx = (p1.x - p2.x).abs();
    let dy = (p1.y - p2.y).abs();
    let wx = (s1.width + s2.width) / 2.0;
    let wy = (s1.height + s2.height) / 2.0;

    if dx == 0.0 && dy == 0.0 {
        if wx <= 0.0 || wy <= 0.0 {
            return (0.0, EXPAND_MIN);
        }
        return (wx.min(wy), EXPAND_MAX);
    }

    let t = if dx < MACHINE_ACCURACY * wx {
        wy / dy
    } else if dy < MACHINE_ACCURACY * wy {
        wx / dx
    } else {
        (wx / dx).min(wy / dy)
    };
    let t = if t > EXPAND_MIN {
        t.max(MIN_OVERLAP_EXPANSION)
    } else {
        t
    };
    let t = t.clamp(EXPAND_MIN, EXPAND_MAX);
    (t * dx.hypot(dy), t)
}

/// Node pairs that carry stress in one iteration, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct ProximityGraph {
    edges: Vec<ProximityEdge>,
    pairs: FxHashSet<(usize, usize)>,
    overlap_count: usize,
}

impl ProximityGraph {
    /// Every Delaunay edge of the centers, overlapping or not.
    pub fn from_triangulation(positions: &[Point], sizes: &[Size]) -> Result<Self> {
        let mut graph = Self::default();
        for (a, b) in delaunay_edges(positions)? {
            graph.insert(a, b, positions, sizes, false);
        }
        Ok(graph)
    }

    /// Adds every overlapping pair the graph does not hold yet, found by an R-tree sweep over all
    /// boxes. Returns the number of added pairs.
    pub fn add_all_overlapping_pairs(&mut self, positions: &[Point], sizes: &[Size]) -> usize {
        let before = self.edges.len();
        BoxIndex::new(positions, sizes).for_each_touching_pair(|a, b| {
            self.insert(a, b, positions, sizes, true);
        });
        self.edges.len() - before
    }

    pub fn edges(&self) -> &[ProximityEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges whose boxes overlap.
    pub fn overlap_count(&self) -> usize {
        self.overlap_count
    }

    fn insert(
        &mut self,
        a: usize,
        b: usize,
        positions: &[Point],
        sizes: &[Size],
        overlaps_only: bool,
    ) -> bool {
        let (a, b) = (a.min(b), a.max(b));
        if a == b || self.pairs.contains(&(a, b)) {
            return false;
        }
        let (desired_distance, overlap_factor) =
            ideal_distance(positions[a], positions[b], sizes[a], sizes[b]);
        let edge = ProximityEdge {
            a,
            b,
            desired_distance,
            overlap_factor,
        };
        if overlaps_only && !edge.is_overlap() {
            return false;
        }
        self.pairs.insert((a, b));
        if edge.is_overlap() {
            self.overlap_count += 1;
        }
        self.edges.push(edge);
        true
    }
}

/// Number of node pairs whose boxes overlap, found by an exhaustive R-tree sweep.
pub(crate) fn count_overlapping_pairs(positions: &[Point], sizes: &[Size]) -> usize {
    let mut count = 0;
    BoxIndex::new(positions, sizes).for_each_touching_pair(|a, b| {
        if ideal_distance(positions[a], positions[b], sizes[a], sizes[b]).1 > EXPAND_MIN {
            count += 1;
        }
    });
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{point, size};

    #[test]
    fn separated_boxes_have_factor_one_and_keep_their_distance() {
        let (d, t) = ideal_distance(point(0.0, 0.0), point(5.0, 0.0), size(2.0, 2.0), size(2.0, 2.0));
        assert_eq!(t, EXPAND_MIN);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn horizontal_overlap_scales_by_the_combined_half_width() {
        // wx = 1, dx = 0.8: t = 1.25.
        let (d, t) = ideal_distance(point(0.0, 0.0), point(0.8, 0.0), size(1.0, 1.0), size(1.0, 1.0));
        assert!((t - 1.25).abs() < 1e-12, "{t}");
        assert!((d - 1.0).abs() < 1e-12, "{d}");
    }

    #[test]
    fn deep_overlap_is_clamped_to_the_maximum_expansion() {
        let (d, t) = ideal_distance(point(0.0, 0.0), point(0.1, 0.0), size(1.0, 1.0), size(1.0, 1.0));
        assert_eq!(t, EXPAND_MAX);
        assert!((d - 0.15).abs() < 1e-12, "{d}");
    }

    #[test]
    fn barely_overlapping_boxes_get_the_minimum_overlap_expansion() {
        let (_, t) = ideal_distance(
            point(0.0, 0.0),
            point(0.9999, 0.0),
            size(1.0, 1.0),
            size(1.0, 1.0),
        );
        assert_eq!(t, MIN_OVERLAP_EXPANSION);
    }

    #[test]
    fn diagonal_pairs_use_the_smaller_axis_ratio() {
        // wx/dx = 1/0.5 = 2, wy/dy = 1/0.9: the boxes separate once y grows by 1/0.9.
        let (_, t) = ideal_distance(point(0.0, 0.0), point(0.5, 0.9), size(1.0, 1.0), size(1.0, 1.0));
        assert!((t - 1.0 / 0.9).abs() < 1e-12, "{t}");
    }

    #[test]
    fn coincident_centers_are_a_maximal_overlap() {
        let (d, t) = ideal_distance(point(1.0, 1.0), point(1.0, 1.0), size(4.0, 2.0), size(2.0, 2.0));
        assert_eq!(t, EXPAND_MAX);
        assert_eq!(d, 2.0);
        let (_, t) = ideal_distance(point(1.0, 1.0), point(1.0, 1.0), size(0.0, 2.0), size(0.0, 2.0));
        assert_eq!(t, EXPAND_MIN);
    }

    #[test]
    fn sweep_adds_only_missing_overlapping_pairs() {
        // Two overlapping pairs far apart; Delaunay links each pair directly.
        let positions = [point(0.0, 0.0), point(0.5, 0.0), point(10.0, 0.0), point(10.5, 0.1)];
        let sizes = [size(1.0, 1.0); 4];
        let mut graph = ProximityGraph::from_triangulation(&positions, &sizes).expect("triangulation");
        assert_eq!(graph.overlap_count(), 2);
        assert_eq!(graph.add_all_overlapping_pairs(&positions, &sizes), 0);
        assert!(graph.edges().iter().all(|e| e.a < e.b));
    }

    #[test]
    fn count_overlapping_pairs_ignores_touching_boxes() {
        let positions = [point(0.0, 0.0), point(1.0, 0.0), point(0.5, 0.2)];
        let sizes = [size(1.0, 1.0); 3];
        // 0-1 touch, 0-2 and 1-2 overlap.
        assert_eq!(count_overlapping_pairs(&positions, &sizes), 2);
    }
}
