use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::error::{Error, Result};
use crate::geom::Point;

struct Site {
    position: Point2<f64>,
    owner: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Undirected Delaunay edges of `points`, as index pairs. Each edge appears once.
///
/// Coincident points collapse into one triangulation vertex, so callers separate them first.
pub(crate) fn delaunay_edges(points: &[Point]) -> Result<Vec<(usize, usize)>> {
    let sites = points
        .iter()
        .enumerate()
        .map(|(owner, p)| Site {
            position: Point2::new(p.x, p.y),
            owner,
        })
        .collect();
    let triangulation: DelaunayTriangulation<Site> = DelaunayTriangulation::bulk_load(sites)
        .map_err(|e| Error::Triangulation(format!("{e:?}")))?;
    Ok(triangulation
        .undirected_edges()
        .map(|edge| {
            let [a, b] = edge.vertices();
            (a.data().owner, b.data().owner)
        })
        .collect())
}
