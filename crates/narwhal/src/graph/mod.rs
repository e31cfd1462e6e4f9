use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::geom::{Point, Rect, Size, rect_around};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Checks that every edge endpoint names a node and that node geometry is usable.
    pub fn validate(&self) -> Result<()> {
        let mut node_exists: FxHashSet<&str> = FxHashSet::default();
        for n in &self.nodes {
            if !node_exists.insert(n.id.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate node id: {}",
                    n.id
                )));
            }
            if !(n.center.x.is_finite() && n.center.y.is_finite()) {
                return Err(Error::InvalidArgument(format!(
                    "node {} has a non-finite center",
                    n.id
                )));
            }
            let s = n.size();
            if !(s.width.is_finite() && s.height.is_finite() && s.width >= 0.0 && s.height >= 0.0)
            {
                return Err(Error::InvalidArgument(format!(
                    "node {} has an invalid size {}x{}",
                    n.id, s.width, s.height
                )));
            }
        }
        for e in &self.edges {
            if !node_exists.contains(e.source.as_str()) || !node_exists.contains(e.target.as_str())
            {
                return Err(Error::MissingEndpoint {
                    edge_id: e.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Bounding box of all node boxes, or `None` for a graph without nodes.
    pub fn bounding_box(&self) -> Option<Rect> {
        crate::geom::union_all(self.nodes.iter().map(Node::bounding_box))
    }
}

/// A node is a box: the layout may move its center but never resizes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub center: Point,
    size: Size,
}

impl Node {
    pub fn new(id: impl Into<String>, center: Point, size: Size) -> Self {
        Self {
            id: id.into(),
            center,
            size,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn bounding_box(&self) -> Rect {
        rect_around(self.center, self.size)
    }
}

/// Edges are carried through untouched; overlap removal only looks at node boxes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}
