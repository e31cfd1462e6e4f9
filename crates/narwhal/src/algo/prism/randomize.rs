use rstar::RTree;

use crate::geom::Point;
use crate::rng::XorShift64Star;

// Failed placements at one radius before the radius doubles.
const ATTEMPTS_PER_RADIUS: usize = 8;

/// Jitters points so that no two lie within `epsilon` of each other. With `randomize_all`, every
/// point is jittered. Returns the number of moved points.
pub(crate) fn randomize_points(
    points: &mut [Point],
    rng: &mut XorShift64Star,
    epsilon: f64,
    randomize_all: bool,
) -> usize {
    let max_distance_2 = epsilon * epsilon;
    let mut accepted: RTree<[f64; 2]> = RTree::new();
    let mut moved = 0;

    for p in points.iter_mut() {
        let origin = *p;
        let mut candidate = origin;
        if randomize_all || is_occupied(&accepted, candidate, max_distance_2) {
            let mut radius = epsilon;
            let mut attempts = 0;
            loop {
                candidate = origin + rng.jitter(radius);
                if !is_occupied(&accepted, candidate, max_distance_2) {
                    break;
                }
                attempts += 1;
                if attempts % ATTEMPTS_PER_RADIUS == 0 {
                    radius *= 2.0;
                }
            }
        }
        if candidate != origin {
            moved += 1;
        }
        accepted.insert([candidate.x, candidate.y]);
        *p = candidate;
    }
    moved
}

fn is_occupied(accepted: &RTree<[f64; 2]>, p: Point, max_distance_2: f64) -> bool {
    accepted
        .locate_within_distance([p.x, p.y], max_distance_2)
        .next()
        .is_some()
}
