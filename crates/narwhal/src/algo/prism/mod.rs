//! PRISM: proximity stress model for node overlap removal.
//!
//! Each iteration triangulates the node centers and turns every Delaunay edge into a stress
//! term. Overlapping pairs ask for their current distance scaled by the overlap factor `t`,
//! and non-overlapping pairs ask to keep their distance. One stress-majorization run then moves
//! the nodes. Once a triangulation reports no overlap, every later iteration also sweeps all boxes
//! with an R-tree, since the triangulation can miss overlaps between non-adjacent nodes. The run
//! finishes when an iteration finds no overlap at all.

pub mod proximity;
mod randomize;
mod spatial;
mod triangulation;

pub use proximity::{
    EXPAND_MAX, EXPAND_MIN, MIN_OVERLAP_EXPANSION, ProximityEdge, ProximityGraph, ideal_distance,
};

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use self::proximity::count_overlapping_pairs;
use self::randomize::randomize_points;
use crate::algo::{OverlapRemovalSettings, validate_node_separation};
use crate::algo::stress::{StressMajorization, Vote};
use crate::error::{Error, Result};
use crate::geom::{Point, Size, rect_around, size, union_all};
use crate::graph::Graph;
use crate::progress::{Algorithm, RunContext};
use crate::rng::XorShift64Star;

const PROXIMITY_BLOCK: usize = 0;
const OVERLAP_BLOCK: usize = 1;
// Overlap votes outweigh plain proximity votes.
const BLOCK_WEIGHTS: [f64; 2] = [1.0, 100.0];

/// Outcome of one overlap-removal run. Areas are in graph units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlapRemovalReport {
    pub iterations: usize,
    /// An iteration found no overlapping pair.
    pub finished: bool,
    pub remaining_overlaps: usize,
    /// The R-tree sweep was active in the last iteration.
    pub scanline_phase: bool,
    pub elapsed: Duration,
    /// Sum of padded node box areas.
    pub node_area: f64,
    /// Area of the bounding box of all padded node boxes.
    pub bounding_box_area: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ProximityOverlapRemoval {
    settings: OverlapRemovalSettings,
    last_run: Option<OverlapRemovalReport>,
}

impl ProximityOverlapRemoval {
    pub fn new(settings: OverlapRemovalSettings) -> Self {
        Self {
            settings,
            last_run: None,
        }
    }

    pub fn settings(&self) -> &OverlapRemovalSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut OverlapRemovalSettings {
        &mut self.settings
    }

    /// Report of the last successful run.
    pub fn last_run(&self) -> Option<&OverlapRemovalReport> {
        self.last_run.as_ref()
    }

    pub fn last_run_iterations(&self) -> usize {
        self.last_run.as_ref().map_or(0, |r| r.iterations)
    }

    pub fn last_run_elapsed(&self) -> Duration {
        self.last_run.as_ref().map_or(Duration::ZERO, |r| r.elapsed)
    }

    /// Moves node centers until no two padded boxes overlap.
    pub fn remove_overlaps(&mut self, graph: &mut Graph) -> Result<OverlapRemovalReport> {
        self.remove_overlaps_with(graph, &mut RunContext::new())
    }

    /// Like [`ProximityOverlapRemoval::remove_overlaps`], reporting progress to and observing
    /// cancellation from `ctx`. On cancellation, node centers hold the result of the last
    /// completed iteration.
    pub fn remove_overlaps_with(
        &mut self,
        graph: &mut Graph,
        ctx: &mut RunContext<'_>,
    ) -> Result<OverlapRemovalReport> {
        self.last_run = None;
        self.settings.validate()?;
        graph.validate()?;
        if graph.nodes.is_empty() {
            return Err(Error::InvalidArgument("graph has no nodes".to_string()));
        }

        let mut run = OverlapRemovalRun::new(graph, &self.settings);
        run.run(ctx)?;
        let report = run.report();
        self.last_run = Some(report.clone());
        Ok(report)
    }
}

/// Number of node pairs whose boxes, padded by `node_separation`, overlap.
pub fn count_overlaps(graph: &Graph, node_separation: f64) -> Result<usize> {
    validate_node_separation(node_separation)?;
    let positions: Vec<Point> = graph.nodes.iter().map(|n| n.center).collect();
    let sizes: Vec<Size> = graph
        .nodes
        .iter()
        .map(|n| n.size() + size(node_separation, node_separation))
        .collect();
    Ok(count_overlapping_pairs(&positions, &sizes))
}

struct OverlapRemovalRun<'g> {
    graph: &'g mut Graph,
    settings: &'g OverlapRemovalSettings,
    /// Working-unit centers.
    positions: Vec<Point>,
    /// Working-unit padded sizes.
    sizes: Vec<Size>,
    rng: XorShift64Star,
    iterations: usize,
    finished: bool,
    scanline_phase: bool,
    remaining_overlaps: usize,
    elapsed: Duration,
}

impl<'g> OverlapRemovalRun<'g> {
    fn new(graph: &'g mut Graph, settings: &'g OverlapRemovalSettings) -> Self {
        let scale = settings.unit_scale();
        let padding = size(settings.node_separation, settings.node_separation);
        let positions = graph.nodes.iter().map(|n| n.center / scale).collect();
        let sizes = graph
            .nodes
            .iter()
            .map(|n| (n.size() + padding) / scale)
            .collect();
        Self {
            graph,
            settings,
            positions,
            sizes,
            rng: XorShift64Star::new(settings.randomization_seed),
            iterations: 0,
            finished: false,
            scanline_phase: false,
            remaining_overlaps: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn single_iteration(
        &mut self,
        stress: &mut StressMajorization,
        ctx: &mut RunContext<'_>,
    ) -> Result<bool> {
        randomize_points(
            &mut self.positions,
            &mut self.rng,
            self.settings.epsilon,
            false,
        );

        let mut proximity = ProximityGraph::from_triangulation(&self.positions, &self.sizes)?;
        let mut overlaps = proximity.overlap_count();
        if self.scanline_phase || overlaps == 0 {
            if !self.scanline_phase {
                debug!(
                    iteration = self.iterations,
                    "triangulation found no overlap, sweeping all boxes from now on"
                );
            }
            self.scanline_phase = true;
            overlaps += proximity.add_all_overlapping_pairs(&self.positions, &self.sizes);
        }
        self.remaining_overlaps = overlaps;
        debug!(
            iteration = self.iterations,
            edges = proximity.len(),
            overlaps,
            scanline_phase = self.scanline_phase,
            "proximity graph built"
        );
        if overlaps == 0 {
            return Ok(true);
        }

        stress.set_positions(&self.positions)?;
        for edge in proximity.edges() {
            let d = edge.desired_distance;
            if d <= 0.0 {
                continue;
            }
            let block = if edge.is_overlap() {
                OVERLAP_BLOCK
            } else {
                PROXIMITY_BLOCK
            };
            stress.add_vote(edge.a, block, Vote::with_distance(edge.b, d));
            stress.add_vote(edge.b, block, Vote::with_distance(edge.a, d));
        }
        let outcome = ctx.run_child_as_step(stress);
        stress.clear_votes();
        outcome?;

        self.positions.copy_from_slice(stress.positions());
        self.write_back();
        Ok(false)
    }

    fn write_back(&mut self) {
        let scale = self.settings.unit_scale();
        for (node, p) in self.graph.nodes.iter_mut().zip(&self.positions) {
            node.center = *p * scale;
        }
    }

    fn report(&self) -> OverlapRemovalReport {
        let scale_2 = self.settings.unit_scale().powi(2);
        let node_area: f64 = self.sizes.iter().map(|s| s.area()).sum();
        let bounding_box_area = union_all(
            self.positions
                .iter()
                .zip(&self.sizes)
                .map(|(p, s)| rect_around(*p, *s)),
        )
        .map_or(0.0, |r| r.area());
        OverlapRemovalReport {
            iterations: self.iterations,
            finished: self.finished,
            remaining_overlaps: self.remaining_overlaps,
            scanline_phase: self.scanline_phase,
            elapsed: self.elapsed,
            node_area: node_area * scale_2,
            bounding_box_area: bounding_box_area * scale_2,
        }
    }
}

impl Algorithm for OverlapRemovalRun<'_> {
    fn run_internal(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let started = Instant::now();
        let settings = self.settings;

        randomize_points(
            &mut self.positions,
            &mut self.rng,
            settings.epsilon,
            settings.randomize_all_points_on_start,
        );
        let mut stress = StressMajorization::new(
            settings.stress_settings,
            self.positions.clone(),
            &BLOCK_WEIGHTS,
        );
        if settings.stop_on_max_iterations {
            ctx.start_listen_to_local_progress(settings.iterations_max);
        }

        while !self.finished
            && (self.iterations < settings.iterations_max || !settings.stop_on_max_iterations)
        {
            ctx.checkpoint()?;
            self.iterations += 1;
            self.finished = self.single_iteration(&mut stress, ctx)?;
        }

        if !self.finished {
            self.remaining_overlaps = count_overlapping_pairs(&self.positions, &self.sizes);
            warn!(
                iterations = self.iterations,
                remaining_overlaps = self.remaining_overlaps,
                "overlap removal stopped at the iteration cap"
            );
        }
        self.write_back();
        self.elapsed = started.elapsed();
        info!(
            nodes = self.positions.len(),
            iterations = self.iterations,
            finished = self.finished,
            remaining_overlaps = self.remaining_overlaps,
            elapsed_ms = self.elapsed.as_secs_f64() * 1000.0,
            "overlap removal finished"
        );
        Ok(())
    }
}
